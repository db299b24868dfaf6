use crate::{
    error::RoleStoreError,
    models::{Identity, Role},
    records::{RecordStore, USERS_COLLECTION},
};

/// resolve_role
///
/// One point lookup of `users/{identity.id}`. A missing document and a document
/// without a usable `role` field both resolve to `Ok(None)`, so callers only ever
/// see a role, no role, or a store failure.
pub async fn resolve_role(
    store: &dyn RecordStore,
    identity: &Identity,
) -> Result<Option<Role>, RoleStoreError> {
    let record = store.get_record(USERS_COLLECTION, &identity.id).await?;

    let role = record.as_ref().and_then(|record| record.role());
    if record.is_some() && role.is_none() {
        tracing::debug!(identity = %identity.id, "user record has no usable role");
    }
    Ok(role)
}
