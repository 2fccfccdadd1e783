use batched_device::Event;

use crate::{KernelError, Result};

/// Completion handle of a kernel launch.
///
/// Local kernels run to completion before returning and hand back a ready
/// handle; accelerator kernels return as soon as the command is enqueued.
/// Results in the output operand are only valid after [`Pending::wait`].
#[must_use = "accelerator results are not valid until the kernel is waited on"]
#[derive(Debug, Clone, Default)]
pub struct Pending {
    event: Event,
}

impl Pending {
    /// A handle for work that has already completed.
    pub fn ready() -> Self {
        Self::default()
    }

    pub(crate) fn new(event: Event) -> Self {
        Self { event }
    }

    /// Backend completion event.
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn is_complete(&self) -> bool {
        self.event.is_complete()
    }

    /// Block until the kernel finished.
    pub fn wait(self) -> Result<()> {
        let status = self.event.wait();
        if status.is_success() {
            Ok(())
        } else {
            Err(KernelError::Backend(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batched_device::StatusCode;

    #[test]
    fn test_ready_is_complete() {
        let p = Pending::ready();
        assert!(p.is_complete());
        p.wait().unwrap();
    }

    #[test]
    fn test_failed_event_maps_to_backend_error() {
        let p = Pending::new(Event::completed(StatusCode::ExecutionFailed));
        assert!(matches!(
            p.wait(),
            Err(KernelError::Backend(StatusCode::ExecutionFailed))
        ));
    }
}
