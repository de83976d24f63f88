use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn is_error(&self) -> bool {
        self.level == ToastLevel::Error
    }

    pub fn css_class(&self) -> &'static str {
        match self.level {
            ToastLevel::Success => "toast-success",
            ToastLevel::Error => "toast-error",
        }
    }
}

/// Notifications raised by controllers, drained by whoever renders the next page.
#[derive(Default, Debug)]
pub struct Toasts {
    pending: Vec<Toast>,
}

impl Toasts {
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message.into());
    }

    fn push(&mut self, level: ToastLevel, message: String) {
        tracing::debug!(?level, %message, "Toast");
        self.pending.push(Toast { level, message });
    }

    pub fn extend(&mut self, other: Toasts) {
        self.pending.extend(other.pending);
    }

    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.pending)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.pending.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn errors(&self) -> usize {
        self.pending.iter().filter(|t| t.is_error()).count()
    }

    pub fn successes(&self) -> usize {
        self.pending.len() - self.errors()
    }
}
