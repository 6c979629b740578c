use std::sync::atomic::{AtomicU32, Ordering};

/// Per-client connection state
///
/// `instance_id` addresses every AVTransport and RenderingControl action.
/// It starts at 0 and only the instance negotiator changes it, at the start
/// of each load.
#[derive(Debug, Default)]
pub struct RendererSession {
    instance_id: AtomicU32,
}

impl RendererSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id.load(Ordering::Acquire)
    }

    pub(crate) fn set_instance_id(&self, instance_id: u32) {
        self.instance_id.store(instance_id, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults_to_instance_zero() {
        let session = RendererSession::new();
        assert_eq!(session.instance_id(), 0);

        session.set_instance_id(3);
        assert_eq!(session.instance_id(), 3);
    }
}
