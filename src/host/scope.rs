/// Guest global scope assembly
///
/// The guest scope is built explicitly from an allowlist, never by
/// cloning or inheriting the host's scope. Denylisted capability names
/// are stripped unconditionally after assembly, so even an allowlist
/// regression cannot hand a denied capability to the guest.
use std::collections::BTreeMap;

use log::warn;

use crate::screen;

/// What a guest global resolves to.
#[derive(Clone, Debug, PartialEq)]
pub enum GlobalSlot {
    /// The buffer constructor and its static helpers
    BufferConstructor,
    /// A codec-backed helper function
    CodecHelper(&'static str),
    /// A bundled convenience library injection point
    Library(&'static str),
    /// A plain data binding
    Value(serde_json::Value),
}

/// Globals every guest scope starts from.
const ALLOWED_GLOBALS: &[(&str, GlobalSlot)] = &[
    ("Buffer", GlobalSlot::BufferConstructor),
    ("isAscii", GlobalSlot::CodecHelper("is_ascii")),
    ("byteLength", GlobalSlot::CodecHelper("byte_length")),
    ("transcode", GlobalSlot::CodecHelper("transcode")),
    ("querystring", GlobalSlot::Library("querystring")),
    ("spreadsheet", GlobalSlot::Library("spreadsheet")),
    ("phonetic", GlobalSlot::Library("phonetic")),
    ("keypair", GlobalSlot::Library("keypair")),
];

/// The explicit global scope handed to the interpreter.
#[derive(Clone, Debug, Default)]
pub struct GuestScope {
    globals: BTreeMap<String, GlobalSlot>,
}

impl GuestScope {
    /// Assemble the standard allowlisted scope.
    pub fn allowlisted() -> Self {
        let mut scope = GuestScope::default();
        for (name, slot) in ALLOWED_GLOBALS {
            scope.globals.insert((*name).to_string(), slot.clone());
        }
        scope.strip_denied();
        scope
    }

    /// Bind the invocation's input value as a guest global.
    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.inject("input", GlobalSlot::Value(input));
        self
    }

    /// Add a global, refusing denylisted names.
    pub fn inject(&mut self, name: &str, slot: GlobalSlot) -> bool {
        if screen::denied_capability(name).is_some() {
            warn!("refusing to inject denylisted global '{}'", name);
            return false;
        }
        self.globals.insert(name.to_string(), slot);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&GlobalSlot> {
        self.globals.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    /// Remove every denylisted name. Defense in depth with the static
    /// screener; both layers consult the same denylist.
    fn strip_denied(&mut self) {
        for (name, _) in screen::DENYLIST {
            self.globals.remove(*name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlisted_scope_has_engine_globals() {
        let scope = GuestScope::allowlisted();
        assert!(scope.contains("Buffer"));
        assert!(scope.contains("querystring"));
        assert_eq!(
            scope.get("transcode"),
            Some(&GlobalSlot::CodecHelper("transcode"))
        );
    }

    #[test]
    fn denylisted_names_resolve_to_absent() {
        let scope = GuestScope::allowlisted();
        for (name, _) in screen::DENYLIST {
            assert!(!scope.contains(name), "{} must be absent", name);
        }
    }

    #[test]
    fn inject_refuses_denied_capability() {
        let mut scope = GuestScope::allowlisted();
        assert!(!scope.inject("Proxy", GlobalSlot::Value(serde_json::json!(1))));
        assert!(!scope.contains("Proxy"));
        assert!(scope.inject("extra", GlobalSlot::Value(serde_json::json!(1))));
    }

    #[test]
    fn input_binding_is_visible() {
        let scope = GuestScope::allowlisted().with_input(serde_json::json!({"n": 3}));
        match scope.get("input") {
            Some(GlobalSlot::Value(v)) => assert_eq!(v["n"], 3),
            other => panic!("unexpected slot: {:?}", other),
        }
    }
}
