/// Literal-aware identifier extraction
///
/// Walks submitted source text and yields every identifier referenced
/// as code, skipping the inside of string literals, template literals,
/// and comments. Template interpolations (`${ ... }`) re-enter code
/// mode, so an identifier smuggled into an interpolation is still seen.
///
/// The walk is a single pass with an explicit context stack; nesting
/// depth is attacker-controlled, so recursion is off the table.

/// One identifier reference found in code position.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentRef<'a> {
    pub name: &'a str,
    /// Byte offset of the identifier within the source.
    pub position: usize,
    /// True when the reference is a property access (`obj.name`),
    /// which resolves against the object, not the global scope.
    pub member_access: bool,
}

#[derive(Clone, Copy)]
enum Ctx {
    /// Plain code; tracks brace depth and whether a closing brace at
    /// depth zero returns to an enclosing template literal.
    Code { depth: u32, from_template: bool },
    /// Inside a template literal body.
    Template,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Extract every code-position identifier reference from `source`.
pub fn identifiers(source: &str) -> Vec<IdentRef<'_>> {
    let cs: Vec<(usize, char)> = source.char_indices().collect();
    let mut out = Vec::new();
    let mut stack = vec![Ctx::Code {
        depth: 0,
        from_template: false,
    }];
    // Previous two significant characters; distinguishes `a.b` from
    // `...b` (spread references the binding itself).
    let mut prev: Option<char> = None;
    let mut prev2: Option<char> = None;
    let mut i = 0;

    while i < cs.len() {
        // The base code frame is never popped, so the stack is nonempty.
        let ctx = match stack.last() {
            Some(&ctx) => ctx,
            None => break,
        };
        match ctx {
            Ctx::Template => {
                let (_, c) = cs[i];
                match c {
                    '\\' => i += 2,
                    '`' => {
                        stack.pop();
                        i += 1;
                    }
                    '$' if matches!(cs.get(i + 1), Some((_, '{'))) => {
                        stack.push(Ctx::Code {
                            depth: 0,
                            from_template: true,
                        });
                        prev = None;
                        prev2 = None;
                        i += 2;
                    }
                    _ => i += 1,
                }
            }
            Ctx::Code {
                depth,
                from_template,
            } => {
                let (pos, c) = cs[i];
                match c {
                    '/' if matches!(cs.get(i + 1), Some((_, '/'))) => {
                        while i < cs.len() && cs[i].1 != '\n' {
                            i += 1;
                        }
                    }
                    '/' if matches!(cs.get(i + 1), Some((_, '*'))) => {
                        i += 2;
                        while i < cs.len() {
                            if cs[i].1 == '*' && matches!(cs.get(i + 1), Some((_, '/'))) {
                                i += 2;
                                break;
                            }
                            i += 1;
                        }
                    }
                    '\'' | '"' => {
                        i = skip_quoted(&cs, i, c);
                        set_prev(&mut prev, &mut prev2, c);
                    }
                    '`' => {
                        stack.push(Ctx::Template);
                        i += 1;
                    }
                    '{' => {
                        if let Some(Ctx::Code { depth, .. }) = stack.last_mut() {
                            *depth += 1;
                        }
                        set_prev(&mut prev, &mut prev2, c);
                        i += 1;
                    }
                    '}' => {
                        if depth == 0 && from_template {
                            stack.pop();
                        } else {
                            if let Some(Ctx::Code { depth, .. }) = stack.last_mut() {
                                *depth = depth.saturating_sub(1);
                            }
                            set_prev(&mut prev, &mut prev2, c);
                        }
                        i += 1;
                    }
                    c if is_ident_start(c) => {
                        while i < cs.len() && is_ident_continue(cs[i].1) {
                            i += 1;
                        }
                        let end = cs.get(i).map(|&(p, _)| p).unwrap_or(source.len());
                        let member_access = prev == Some('.') && prev2 != Some('.');
                        out.push(IdentRef {
                            name: &source[pos..end],
                            position: pos,
                            member_access,
                        });
                        set_prev(&mut prev, &mut prev2, 'a');
                    }
                    c if c.is_whitespace() => {
                        i += 1;
                    }
                    c => {
                        set_prev(&mut prev, &mut prev2, c);
                        i += 1;
                    }
                }
            }
        }
    }
    out
}

fn set_prev(prev: &mut Option<char>, prev2: &mut Option<char>, c: char) {
    *prev2 = *prev;
    *prev = Some(c);
}

/// Skip a quoted string starting at the opening quote; returns the
/// index just past the closing quote. Unterminated strings run to the
/// end of input.
fn skip_quoted(cs: &[(usize, char)], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < cs.len() {
        match cs[i].1 {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    i
}
