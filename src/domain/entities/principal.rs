//! Authenticated caller identity.

/// The owner a request acts on behalf of.
///
/// Issued by the credential collaborator and carried as a bearer token; the
/// service only ever sees the verified owner id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    pub id: String,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
