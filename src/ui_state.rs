/// The single observable value describing where a prompt request is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    /// No request made yet
    #[default]
    Initial,
    /// A request is in flight
    Loading,
    /// Response text; grows while a streaming response arrives
    Success(String),
    /// Human-readable failure description
    Error(String),
}

impl UiState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(text) => Some(text),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_initial() {
        assert_eq!(UiState::default(), UiState::Initial);
    }

    #[test]
    fn test_accessors() {
        assert!(UiState::Loading.is_loading());
        assert!(!UiState::Initial.is_loading());
        assert_eq!(UiState::Success("cake".into()).text(), Some("cake"));
        assert_eq!(UiState::Error("oops".into()).text(), None);
        assert_eq!(UiState::Error("oops".into()).error(), Some("oops"));
        assert_eq!(UiState::Success("cake".into()).error(), None);
        assert_eq!(UiState::Loading.error(), None);
    }
}
