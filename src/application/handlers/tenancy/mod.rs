//! Tenancy handlers: platform tenant administration and membership lifecycle.

mod accept_invitation;
mod change_member_role;
mod create_tenant;
mod invite_member;
mod join_tenant;
mod list_my_memberships;
mod remove_member;
mod set_tenant_status;

pub use accept_invitation::AcceptInvitationHandler;
pub use change_member_role::{ChangeMemberRoleCommand, ChangeMemberRoleHandler};
pub use create_tenant::{CreateTenantCommand, CreateTenantHandler};
pub use invite_member::{InviteMemberCommand, InviteMemberHandler};
pub use join_tenant::{JoinTenantHandler, JoinTenantResult};
pub use list_my_memberships::{ListMyMembershipsHandler, MeView};
pub use remove_member::RemoveMemberHandler;
pub use set_tenant_status::{SetTenantStatusCommand, SetTenantStatusHandler};
