// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Payload decoder dispatch.
//
// Application payloads are opaque to the interpreter. Decoders for them are
// registered at start of day, either under an IDL module name (explicit) or
// in a heuristic list that is probed in registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cdr::{CdrCursor, Encoding, GiopVersion};
use crate::error::DecodeResult;
use crate::message::{MessageKind, ReplyStatus};
use crate::report::ReportSink;

/// Operation name handed to probes and decoders for a reply whose request
/// was never seen.
pub const UNKNOWN_OPERATION: &str = "";

/// Everything a payload decoder gets to see.
///
/// The cursor sits at the start of the request or reply body; `encoding` is
/// the message-level context (origin at the GIOP header).
pub struct PayloadContext<'a, 'r> {
    pub cursor: &'r mut CdrCursor<'a>,
    pub encoding: Encoding,
    pub version: GiopVersion,
    pub kind: MessageKind,
    pub request_id: u32,
    /// [`UNKNOWN_OPERATION`] for a reply with no matching request.
    pub operation: &'r str,
    /// Set for replies.
    pub reply_status: Option<ReplyStatus>,
    /// Repository id of a user exception being returned.
    pub exception_id: Option<&'r str>,
    /// Nesting limit to hand to the TypeCode decoder.
    pub max_typecode_depth: usize,
    pub sink: &'r mut dyn ReportSink,
}

impl PayloadContext<'_, '_> {
    pub fn is_reply(&self) -> bool {
        self.kind == MessageKind::Reply
    }
}

/// Decoder for one IDL interface (or family of interfaces).
pub trait PayloadDecoder: Send + Sync + 'static {
    /// Whether this decoder recognises the payload. Only consulted for
    /// heuristic dispatch.
    ///
    /// A reply with no matching request is probed with
    /// [`UNKNOWN_OPERATION`], so a probe keyed on operation names declines
    /// it unless it also checks `body`.
    fn probe(&self, _operation: &str, _body: &[u8]) -> bool {
        true
    }

    /// Decode the body at `ctx.cursor`, reporting fields to `ctx.sink`.
    fn decode(&self, ctx: &mut PayloadContext<'_, '_>) -> DecodeResult<()>;
}

/// A function-based payload decoder (accepts every payload when probed).
impl<F> PayloadDecoder for F
where
    F: Fn(&mut PayloadContext<'_, '_>) -> DecodeResult<()> + Send + Sync + 'static,
{
    fn decode(&self, ctx: &mut PayloadContext<'_, '_>) -> DecodeResult<()> {
        self(ctx)
    }
}

/// Shared handle to a registered decoder.
///
/// Cloning is cheap. The enabled flag is shared between clones so a decoder
/// can be switched off after registration.
#[derive(Clone)]
pub struct DecoderHandle {
    name: Arc<str>,
    decoder: Arc<dyn PayloadDecoder>,
    enabled: Arc<AtomicBool>,
}

impl DecoderHandle {
    pub fn new(name: &str, decoder: impl PayloadDecoder) -> Self {
        Self {
            name: Arc::from(name),
            decoder: Arc::new(decoder),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn probe(&self, operation: &str, body: &[u8]) -> bool {
        self.decoder.probe(operation, body)
    }

    pub fn decode(&self, ctx: &mut PayloadContext<'_, '_>) -> DecodeResult<()> {
        self.decoder.decode(ctx)
    }

    /// Same registration (not merely the same name).
    pub fn same_as(&self, other: &DecoderHandle) -> bool {
        Arc::ptr_eq(&self.enabled, &other.enabled)
    }
}

impl fmt::Debug for DecoderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderHandle")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Module name of a repository id: the text after the 4-character prefix
/// up to the first `/` or `:`.
///
/// `"IDL:Shapes/Circle:1.0"` gives `"Shapes"`.
pub fn module_from_repo_id(interface_id: &str) -> Option<&str> {
    let rest = interface_id.get(4..)?;
    let end = rest.find(|c: char| c == '/' || c == ':').unwrap_or(rest.len());
    let module = &rest[..end];
    (!module.is_empty()).then_some(module)
}

/// Registered payload decoders.
#[derive(Debug)]
pub struct DispatchTable {
    explicit: HashMap<String, DecoderHandle>,
    heuristic: Vec<DecoderHandle>,
    heuristics_enabled: bool,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self {
            explicit: HashMap::new(),
            heuristic: Vec::new(),
            heuristics_enabled: true,
        }
    }
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder for every interface in IDL module `module`.
    /// A later registration for the same module replaces the earlier one.
    pub fn register_interface(
        &mut self,
        module: &str,
        name: &str,
        decoder: impl PayloadDecoder,
    ) -> DecoderHandle {
        let handle = DecoderHandle::new(name, decoder);
        log::debug!("[giop] decoder '{}' registered for module '{}'", name, module);
        self.explicit.insert(module.to_owned(), handle.clone());
        handle
    }

    /// Append a decoder to the heuristic list.
    pub fn register_heuristic(&mut self, name: &str, decoder: impl PayloadDecoder) -> DecoderHandle {
        let handle = DecoderHandle::new(name, decoder);
        log::debug!("[giop] heuristic decoder '{}' registered", name);
        self.heuristic.push(handle.clone());
        handle
    }

    /// Turn the heuristic list on or off as a whole.
    pub fn set_heuristics_enabled(&mut self, enabled: bool) {
        self.heuristics_enabled = enabled;
    }

    /// Enabled explicit decoder for `interface_id`'s module.
    pub fn explicit(&self, interface_id: &str) -> Option<DecoderHandle> {
        let module = module_from_repo_id(interface_id)?;
        self.explicit
            .get(module)
            .filter(|h| h.is_enabled())
            .cloned()
    }

    /// Pick the decoder for a payload.
    ///
    /// An explicit decoder for the interface's module wins; otherwise the
    /// first enabled heuristic decoder that accepts the payload.
    pub fn resolve(&self, interface_id: Option<&str>, operation: &str, body: &[u8]) -> Option<DecoderHandle> {
        if let Some(handle) = interface_id.and_then(|id| self.explicit(id)) {
            return Some(handle);
        }
        if !self.heuristics_enabled {
            return None;
        }
        self.heuristic
            .iter()
            .find(|h| h.is_enabled() && h.probe(operation, body))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.explicit.len() + self.heuristic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_ctx: &mut PayloadContext<'_, '_>) -> DecodeResult<()> {
        Ok(())
    }

    struct OperationProbe(&'static str);

    impl PayloadDecoder for OperationProbe {
        fn probe(&self, operation: &str, _body: &[u8]) -> bool {
            operation == self.0
        }

        fn decode(&self, _ctx: &mut PayloadContext<'_, '_>) -> DecodeResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_module_from_repo_id() {
        assert_eq!(module_from_repo_id("IDL:Shapes/Circle:1.0"), Some("Shapes"));
        assert_eq!(module_from_repo_id("IDL:Echo:1.0"), Some("Echo"));
        assert_eq!(module_from_repo_id("IDL:omg.org/CosNaming/NamingContext:1.0"), Some("omg.org"));
        assert_eq!(module_from_repo_id("IDL:"), None);
        assert_eq!(module_from_repo_id("ID"), None);
    }

    #[test]
    fn test_explicit_resolution() {
        let mut table = DispatchTable::new();
        let shapes = table.register_interface("Shapes", "shapes", noop);
        let got = table.resolve(Some("IDL:Shapes/Circle:1.0"), "area", &[]).unwrap();
        assert!(got.same_as(&shapes));
        assert_eq!(got.name(), "shapes");
    }

    #[test]
    fn test_disabled_explicit_falls_back_to_heuristics() {
        let mut table = DispatchTable::new();
        let shapes = table.register_interface("Shapes", "shapes", noop);
        let heur = table.register_heuristic("catch-all", noop);
        shapes.set_enabled(false);
        let got = table.resolve(Some("IDL:Shapes/Circle:1.0"), "area", &[]).unwrap();
        assert!(got.same_as(&heur));
    }

    #[test]
    fn test_heuristics_in_registration_order() {
        let mut table = DispatchTable::new();
        let first = table.register_heuristic("first", OperationProbe("ping"));
        let second = table.register_heuristic("second", OperationProbe("ping"));
        let third = table.register_heuristic("third", OperationProbe("echo"));

        assert!(table.resolve(None, "ping", &[]).unwrap().same_as(&first));
        first.set_enabled(false);
        assert!(table.resolve(None, "ping", &[]).unwrap().same_as(&second));
        assert!(table.resolve(Some("IDL:Unknown:1.0"), "echo", &[]).unwrap().same_as(&third));
        assert!(table.resolve(None, "other", &[]).is_none());
    }

    #[test]
    fn test_heuristics_switch() {
        let mut table = DispatchTable::new();
        table.register_heuristic("any", noop);
        table.set_heuristics_enabled(false);
        assert!(table.resolve(None, "op", &[]).is_none());
        assert_eq!(table.len(), 1);
    }
}
