use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AppError::credential_missing("no_credential", "none").http_status(), 401);
    assert_eq!(AppError::credential_invalid("credential_invalid", "bad").http_status(), 401);
    assert_eq!(AppError::resolver_unavailable("resolver_unavailable", "down").http_status(), 401);
    assert_eq!(AppError::forbidden("forbidden", "no").http_status(), 403);
    assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
    assert_eq!(AppError::user("bad_scope", "oops").http_status(), 400);
    assert_eq!(AppError::validation("resource_ref_required", "empty").http_status(), 422);
    assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
}

#[test]
fn auth_failures_share_public_code() {
    let missing = AppError::credential_missing("no_credential", "no credential supplied");
    let invalid = AppError::credential_invalid("credential_invalid", "session expired");
    let down = AppError::resolver_unavailable("resolver_unavailable", "connection refused");
    for e in [&missing, &invalid, &down] {
        assert!(e.is_auth_failure());
        assert_eq!(e.public_code(), "unauthorized");
        assert_eq!(e.public_message(), "authentication required");
    }
    // Operators still see the distinct code.
    assert_eq!(down.code_str(), "resolver_unavailable");
    assert_eq!(down.to_string(), "resolver_unavailable: connection refused");
}

#[test]
fn resolve_error_conversion() {
    let e: AppError = ResolveError::Expired.into();
    assert!(matches!(e, AppError::CredentialInvalid { .. }));
    let e: AppError = ResolveError::Unavailable("timeout".into()).into();
    assert!(matches!(e, AppError::ResolverUnavailable { .. }));
    assert_eq!(e.message(), "timeout");
}

#[test]
fn vault_error_conversion() {
    let e: AppError = VaultError::EmptyResourceRef.into();
    assert_eq!(e.http_status(), 422);
    let e: AppError = VaultError::ScopeRequiresIdentity.into();
    assert_eq!(e.http_status(), 400);
    assert_eq!(e.public_code(), "scope_requires_identity");
}
