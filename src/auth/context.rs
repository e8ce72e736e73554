/// The billing principal a request acts on behalf of.
///
/// Inserted into request extensions by the auth middleware. The upstream
/// gateway authenticates the user and forwards the id in the
/// `x-principal-id` header; this service trusts the forwarded id as-is.
/// Handlers extract it via `Extension<Principal>` and use it for credit
/// checks and deductions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Identifier of the billing principal (credit ledger row key).
    pub id: String,
}

impl Principal {
    /// Create a new Principal with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_new() {
        let principal = Principal::new("user-42");
        assert_eq!(principal.id, "user-42");
    }
}
