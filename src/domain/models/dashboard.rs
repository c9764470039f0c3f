use crate::domain::models::commit::CommitEntry;
use crate::domain::models::credentials::Credentials;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<CommitEntry>),
    Failed,
}

/// Everything one dashboard session shows.
///
/// `form` holds the in-progress (possibly unsaved) input values. `countdown` is `Some` only while
/// the last fetch succeeded and no other fetch has started since.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub form: Credentials,
    pub fetch: FetchState,
    pub countdown: Option<u32>,
}

impl DashboardState {
    pub fn new(form: Credentials) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.fetch == FetchState::Loading
    }

    pub fn commits(&self) -> &[CommitEntry] {
        match &self.fetch {
            FetchState::Loaded(entries) => entries.as_slice(),
            _ => &[],
        }
    }
}
