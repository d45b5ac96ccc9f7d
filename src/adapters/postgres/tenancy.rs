//! PostgreSQL implementations of the user, tenant and membership ports.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{AuthenticatedUser, DomainError, TenantId, Timestamp, UserId};
use crate::domain::tenancy::{
    AccessError, Role, Tenant, TenantMembership, TenantSlug, TenantStatus, User,
};
use crate::ports::{
    MembershipRepository, MutateFn, Mutated, TenantRepository, UserRepository,
};

use super::tx::{
    begin_system, begin_tenant, col, commit, db_error, id, insert_audit, opt_id, parsed, ts,
};

const USER_COLUMNS: &str = "id, auth_subject, email, display_name, created_at, updated_at";
const TENANT_COLUMNS: &str = "id, slug, name, plan, status, created_at, updated_at";
const MEMBERSHIP_COLUMNS: &str =
    "id, tenant_id, user_id, role, status, invited_by, created_at, updated_at";

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn upsert_by_subject(&self, identity: &AuthenticatedUser) -> Result<User, DomainError> {
        let fresh = User::first_seen(identity, Timestamp::now());
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users ({USER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (auth_subject) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                updated_at = CASE
                    WHEN users.email IS DISTINCT FROM EXCLUDED.email
                      OR users.display_name IS DISTINCT FROM EXCLUDED.display_name
                    THEN EXCLUDED.updated_at
                    ELSE users.updated_at
                END
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(fresh.id.as_uuid())
        .bind(&fresh.auth_subject)
        .bind(&fresh.email)
        .bind(&fresh.display_name)
        .bind(fresh.created_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("upsert user"))?;

        user_from_row(&row)
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch user"))?;
        row.as_ref().map(user_from_row).transpose()
    }
}

/// PostgreSQL implementation of TenantRepository.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn create(&self, tenant: &Tenant, audit: &AuditEntry) -> Result<(), DomainError> {
        let mut tx = begin_system(&self.pool).await?;
        sqlx::query(&format!(
            "INSERT INTO tenants ({TENANT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(tenant.id.as_uuid())
        .bind(tenant.slug.as_str())
        .bind(&tenant.name)
        .bind(&tenant.plan)
        .bind(tenant.status.as_str())
        .bind(tenant.created_at.as_datetime())
        .bind(tenant.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert tenant"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await
    }

    async fn find_by_id(&self, tenant_id: TenantId) -> Result<Option<Tenant>, DomainError> {
        let row = sqlx::query(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"))
            .bind(tenant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch tenant"))?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn update_status(
        &self,
        tenant_id: TenantId,
        status: TenantStatus,
        audit: &AuditEntry,
    ) -> Result<Option<Tenant>, DomainError> {
        let mut tx = begin_system(&self.pool).await?;
        let row = sqlx::query(&format!(
            "UPDATE tenants SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {TENANT_COLUMNS}"
        ))
        .bind(tenant_id.as_uuid())
        .bind(status.as_str())
        .bind(audit.created_at.as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("update tenant status"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let tenant = tenant_from_row(&row)?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(Some(tenant))
    }
}

/// PostgreSQL implementation of MembershipRepository.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn find(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Option<TenantMembership>, DomainError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM tenant_memberships WHERE tenant_id = $1 AND user_id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch membership"))?;
        commit(tx).await?;
        row.as_ref().map(membership_from_row).transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<TenantMembership>, DomainError> {
        let mut tx = begin_system(&self.pool).await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS} FROM tenant_memberships
            WHERE user_id = $1 AND status <> 'removed'
            ORDER BY created_at
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("list memberships"))?;
        commit(tx).await?;
        rows.iter().map(membership_from_row).collect()
    }

    async fn is_platform_admin(&self, user_id: UserId) -> Result<bool, DomainError> {
        let mut tx = begin_system(&self.pool).await?;
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenant_memberships
                WHERE user_id = $1 AND role = 'platform_admin' AND status = 'active'
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("check platform admin"))?;
        commit(tx).await?;
        Ok(exists)
    }

    async fn insert_if_absent(
        &self,
        membership: &TenantMembership,
        audit: &AuditEntry,
    ) -> Result<(TenantMembership, bool), DomainError> {
        let mut tx = begin_tenant(&self.pool, membership.tenant_id).await?;
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO tenant_memberships ({MEMBERSHIP_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (tenant_id, user_id) DO NOTHING
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(membership.id.as_uuid())
        .bind(membership.tenant_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(membership.role.as_str())
        .bind(membership.status.as_str())
        .bind(membership.invited_by.map(|u| *u.as_uuid()))
        .bind(membership.created_at.as_datetime())
        .bind(membership.updated_at.as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("insert membership"))?;

        if let Some(row) = inserted {
            let stored = membership_from_row(&row)?;
            insert_audit(&mut tx, audit).await?;
            commit(tx).await?;
            return Ok((stored, true));
        }

        let existing = sqlx::query(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM tenant_memberships WHERE tenant_id = $1 AND user_id = $2"
        ))
        .bind(membership.tenant_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("fetch existing membership"))?;
        commit(tx).await?;
        Ok((membership_from_row(&existing)?, false))
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        apply: &MutateFn<'_, TenantMembership, Role, AccessError>,
    ) -> Result<Mutated<TenantMembership, Role>, AccessError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS} FROM tenant_memberships
            WHERE tenant_id = $1 AND user_id = $2
            FOR UPDATE
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock membership"))?;
        let Some(row) = row else {
            return Err(AccessError::MembershipNotFound { tenant_id, user_id });
        };

        let stored = membership_from_row(&row)?;
        let mut working = stored.clone();
        let mutation = apply(&mut working)?;
        let Some(audit) = mutation.audit else {
            commit(tx).await?;
            return Ok(Mutated {
                entity: stored,
                child: mutation.child,
                written: false,
            });
        };

        sqlx::query(
            "UPDATE tenant_memberships SET role = $2, status = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(working.id.as_uuid())
        .bind(working.role.as_str())
        .bind(working.status.as_str())
        .bind(working.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("update membership"))?;
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;

        Ok(Mutated {
            entity: working,
            child: mutation.child,
            written: true,
        })
    }
}

fn user_from_row(row: &PgRow) -> Result<User, DomainError> {
    Ok(User {
        id: id(row, "id")?,
        auth_subject: col(row, "auth_subject")?,
        email: col(row, "email")?,
        display_name: col(row, "display_name")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn tenant_from_row(row: &PgRow) -> Result<Tenant, DomainError> {
    let slug: String = col(row, "slug")?;
    Ok(Tenant {
        id: id(row, "id")?,
        slug: TenantSlug::new(slug)?,
        name: col(row, "name")?,
        plan: col(row, "plan")?,
        status: parsed(row, "status")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn membership_from_row(row: &PgRow) -> Result<TenantMembership, DomainError> {
    Ok(TenantMembership {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        user_id: id(row, "user_id")?,
        role: parsed(row, "role")?,
        status: parsed(row, "status")?,
        invited_by: opt_id(row, "invited_by")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}
