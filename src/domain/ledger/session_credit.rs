//! Session packages, credits and usage logs.
//!
//! `used_sessions <= total_sessions` holds for every credit. A log that
//! names a credit is only produced after the credit accepted the consume.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    BookingId, Money, SessionCreditId, SessionLogId, SessionPackageId, TenantId, Timestamp,
    UserId, ValidationError,
};

use super::LedgerError;

/// Sellable bundle of sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPackage {
    pub id: SessionPackageId,
    pub tenant_id: TenantId,
    pub name: String,
    pub session_count: u32,
    pub price: Money,
    pub validity_days: Option<u32>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl SessionPackage {
    pub fn create(
        tenant_id: TenantId,
        name: impl Into<String>,
        session_count: u32,
        price: Money,
        validity_days: Option<u32>,
        now: Timestamp,
    ) -> Result<Self, LedgerError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        if session_count == 0 || session_count > 1_000 {
            return Err(ValidationError::out_of_range(
                "sessionCount",
                1,
                1_000,
                i64::from(session_count),
            )
            .into());
        }
        if price.is_negative() {
            return Err(LedgerError::validation("price", "must not be negative"));
        }
        if validity_days == Some(0) {
            return Err(LedgerError::validation("validityDays", "must be at least 1"));
        }

        Ok(Self {
            id: SessionPackageId::new(),
            tenant_id,
            name,
            session_count,
            price,
            validity_days,
            is_active: true,
            created_at: now,
        })
    }
}

/// A client's balance of sessions from one package purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredit {
    pub id: SessionCreditId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub package_id: Option<SessionPackageId>,
    pub total_sessions: u32,
    pub used_sessions: u32,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SessionCredit {
    /// Grants a client the sessions of an active package.
    pub fn grant(
        package: &SessionPackage,
        user_id: UserId,
        now: Timestamp,
    ) -> Result<Self, LedgerError> {
        if !package.is_active {
            return Err(LedgerError::Inactive);
        }
        Ok(Self {
            id: SessionCreditId::new(),
            tenant_id: package.tenant_id,
            user_id,
            package_id: Some(package.id),
            total_sessions: package.session_count,
            used_sessions: 0,
            expires_at: package.validity_days.map(|days| now.add_days(i64::from(days))),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn remaining(&self) -> u32 {
        self.total_sessions.saturating_sub(self.used_sessions)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used_sessions >= self.total_sessions
    }

    /// Uses one session on behalf of `client_id`.
    pub fn consume(&mut self, client_id: UserId, now: Timestamp) -> Result<(), LedgerError> {
        if self.user_id != client_id {
            return Err(LedgerError::validation(
                "creditId",
                "credit does not belong to this client",
            ));
        }
        if self.expires_at.map_or(false, |at| !now.is_before(&at)) {
            return Err(LedgerError::Expired);
        }
        if self.is_exhausted() {
            return Err(LedgerError::CreditsExhausted);
        }
        self.used_sessions += 1;
        self.updated_at = now;
        Ok(())
    }
}

/// Caller-supplied details of a delivered session.
#[derive(Debug, Clone)]
pub struct NewSessionLog {
    pub client_id: UserId,
    pub coach_id: UserId,
    pub credit_id: Option<SessionCreditId>,
    pub booking_id: Option<BookingId>,
    pub session_date: Timestamp,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLog {
    pub id: SessionLogId,
    pub tenant_id: TenantId,
    pub client_id: UserId,
    pub coach_id: UserId,
    pub credit_id: Option<SessionCreditId>,
    pub booking_id: Option<BookingId>,
    pub session_date: Timestamp,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub logged_by: UserId,
    pub created_at: Timestamp,
}

impl SessionLog {
    pub fn record(
        tenant_id: TenantId,
        request: NewSessionLog,
        logged_by: UserId,
        now: Timestamp,
    ) -> Result<Self, LedgerError> {
        if let Some(minutes) = request.duration_minutes {
            if minutes == 0 || minutes > 24 * 60 {
                return Err(ValidationError::out_of_range(
                    "durationMinutes",
                    1,
                    24 * 60,
                    i64::from(minutes),
                )
                .into());
            }
        }
        Ok(Self {
            id: SessionLogId::new(),
            tenant_id,
            client_id: request.client_id,
            coach_id: request.coach_id,
            credit_id: request.credit_id,
            booking_id: request.booking_id,
            session_date: request.session_date,
            duration_minutes: request.duration_minutes,
            notes: request.notes,
            logged_by,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(count: u32) -> SessionPackage {
        SessionPackage::create(
            TenantId::new(),
            "Ten pack",
            count,
            Money::from_cents(50_000),
            None,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn consume_stops_at_total() {
        let client = UserId::new();
        let mut credit = SessionCredit::grant(&package(2), client, Timestamp::now()).unwrap();

        credit.consume(client, Timestamp::now()).unwrap();
        credit.consume(client, Timestamp::now()).unwrap();
        assert!(credit.is_exhausted());

        let err = credit.consume(client, Timestamp::now()).unwrap_err();
        assert_eq!(err, LedgerError::CreditsExhausted);
        assert_eq!(credit.used_sessions, 2);
    }

    #[test]
    fn consume_rejects_other_clients() {
        let mut credit = SessionCredit::grant(&package(2), UserId::new(), Timestamp::now()).unwrap();
        let err = credit.consume(UserId::new(), Timestamp::now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert_eq!(credit.used_sessions, 0);
    }

    #[test]
    fn grant_applies_validity_window() {
        let now = Timestamp::now();
        let mut pkg = package(5);
        pkg.validity_days = Some(30);
        let client = UserId::new();
        let mut credit = SessionCredit::grant(&pkg, client, now).unwrap();
        assert_eq!(credit.expires_at, Some(now.add_days(30)));
        assert_eq!(credit.consume(client, now.add_days(31)), Err(LedgerError::Expired));
    }

    #[test]
    fn grant_from_inactive_package_fails() {
        let mut pkg = package(5);
        pkg.is_active = false;
        assert_eq!(
            SessionCredit::grant(&pkg, UserId::new(), Timestamp::now()),
            Err(LedgerError::Inactive)
        );
    }

    #[test]
    fn package_requires_sessions() {
        let result = SessionPackage::create(
            TenantId::new(),
            "Empty",
            0,
            Money::ZERO,
            None,
            Timestamp::now(),
        );
        assert!(matches!(result, Err(LedgerError::Validation { .. })));
    }

    #[test]
    fn log_rejects_zero_duration() {
        let result = SessionLog::record(
            TenantId::new(),
            NewSessionLog {
                client_id: UserId::new(),
                coach_id: UserId::new(),
                credit_id: None,
                booking_id: None,
                session_date: Timestamp::now(),
                duration_minutes: Some(0),
                notes: None,
            },
            UserId::new(),
            Timestamp::now(),
        );
        assert!(result.is_err());
    }
}
