use crate::app::{App, Model, ToastLevel};
use crate::chat::{RequestKind, RequestSpec, read_aloud, send_context};

impl App {
    /// Launch the background request `update` queued, if any.
    pub(super) fn handle_message_side_effects(&self, model: &mut Model) {
        let Some(spec) = model.outbox.take() else {
            return;
        };
        self.launch_request(model, spec);
    }

    fn launch_request(&self, model: &mut Model, spec: RequestSpec) {
        if spec.kind == RequestKind::ReadAloud {
            match read_aloud(&self.backends, spec) {
                Some(pending) => model.attach_request(pending),
                None => model.show_toast(
                    ToastLevel::Warning,
                    "Speech is disabled (see --speech-command)",
                ),
            }
            return;
        }
        let context = model.request_context(spec.kind);
        let pending = send_context(&self.backends, spec, context);
        model.attach_request(pending);
    }
}
