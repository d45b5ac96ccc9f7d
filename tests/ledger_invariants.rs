//! Ledger invariants under concurrency: balances never go negative, use
//! limits are never exceeded, and every successful mutation leaves exactly
//! one audit entry behind.

use std::sync::Arc;

use futures::future::join_all;
use proptest::prelude::*;

use tenant_ledger::adapters::events::InMemoryEventBus;
use tenant_ledger::adapters::memory::InMemoryStore;
use tenant_ledger::application::handlers::gift_card::{
    IssueGiftCardCommand, IssueGiftCardHandler, RedeemGiftCardCommand, RedeemGiftCardHandler,
};
use tenant_ledger::application::handlers::session_credit::{
    CreatePackageCommand, CreatePackageHandler, GrantCreditCommand, GrantCreditHandler,
    LogSessionHandler,
};
use tenant_ledger::application::handlers::voucher::{
    CreateVoucherHandler, RedeemVoucherCommand, RedeemVoucherHandler,
};
use tenant_ledger::application::Notifier;
use tenant_ledger::domain::audit::{AuditAction, AuditActor, AuditEntry};
use tenant_ledger::domain::foundation::{ErrorCode, Money, TenantId, Timestamp, UserId};
use tenant_ledger::domain::ledger::{
    GiftCard, GiftCardCode, GiftCardStatus, NewSessionLog, NewVoucher, VoucherType,
};
use tenant_ledger::domain::tenancy::{Role, Tenant, TenantContext, TenantSlug};
use tenant_ledger::ports::{GiftCardRepository, TenantRepository, VoucherRepository};

async fn tenant(store: &InMemoryStore) -> TenantId {
    let slug = TenantSlug::new(format!("t-{}", TenantId::new())).unwrap();
    let tenant = Tenant::create(slug, "Invariants", "starter", Timestamp::now()).unwrap();
    let audit = AuditEntry::record(
        AuditActor::system("test"),
        None,
        AuditAction::TenantCreated,
        "tenant",
        tenant.id,
    );
    TenantRepository::create(store, &tenant, &audit).await.unwrap();
    tenant.id
}

fn notifier() -> Notifier {
    Notifier::new(Arc::new(InMemoryEventBus::new()))
}

async fn count_audits(store: &InMemoryStore, action: AuditAction) -> usize {
    store
        .audit_entries()
        .await
        .iter()
        .filter(|e| e.action == action)
        .count()
}

async fn issue_card(store: &InMemoryStore, ctx: &TenantContext, balance: i64) -> String {
    IssueGiftCardHandler::new(Arc::new(store.clone()), notifier())
        .handle(
            ctx,
            IssueGiftCardCommand {
                initial_balance: balance,
                currency: None,
                expires_at: None,
                recipient_name: None,
                recipient_email: None,
                message: None,
                purchased_by: None,
            },
        )
        .await
        .unwrap()
        .code
        .to_string()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemptions_never_overdraw() {
    let store = InMemoryStore::new();
    let tenant_id = tenant(&store).await;
    let staff = TenantContext::new(tenant_id, UserId::new(), Role::Staff);
    let code = issue_card(&store, &staff, 10_000).await;
    let handler = Arc::new(RedeemGiftCardHandler::new(Arc::new(store.clone()), notifier()));

    let attempts = (0..20).map(|_| {
        let handler = handler.clone();
        let code = code.clone();
        tokio::spawn(async move {
            handler
                .handle(
                    &staff,
                    RedeemGiftCardCommand {
                        code,
                        amount: 1_000,
                        reference: None,
                    },
                )
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(succeeded.len(), 10);
    // Late arrivals find the card depleted rather than short.
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.code(),
            ErrorCode::InsufficientBalance | ErrorCode::InvalidStateTransition
        ));
    }

    let last = succeeded
        .iter()
        .min_by_key(|r| r.card.current_balance)
        .unwrap();
    assert_eq!(last.card.current_balance, Money::from_cents(0));
    assert_eq!(last.card.status, GiftCardStatus::Depleted);
    assert_eq!(count_audits(&store, AuditAction::GiftCardRedeemed).await, 10);

    let code = GiftCardCode::parse(&code).unwrap();
    let stored = GiftCardRepository::find_by_code(&store, tenant_id, &code)
        .await
        .unwrap()
        .unwrap();
    let history = GiftCardRepository::history(&store, tenant_id, stored.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 11);
    assert_eq!(GiftCard::ledger_balance(&history), stored.current_balance);
    assert_eq!(stored.current_balance, Money::from_cents(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn voucher_use_limit_holds_under_contention() {
    let store = InMemoryStore::new();
    let tenant_id = tenant(&store).await;
    let admin = TenantContext::new(tenant_id, UserId::new(), Role::Admin);
    let voucher = CreateVoucherHandler::new(Arc::new(store.clone()))
        .handle(
            &admin,
            NewVoucher {
                code: "SPRING10".to_string(),
                voucher_type: VoucherType::Percentage,
                value: 10,
                max_uses: Some(3),
                expires_at: None,
                description: None,
            },
        )
        .await
        .unwrap();
    let handler = Arc::new(RedeemVoucherHandler::new(Arc::new(store.clone()), notifier()));

    let attempts = (0..10).map(|_| {
        let handler = handler.clone();
        let customer = TenantContext::new(tenant_id, UserId::new(), Role::Customer);
        tokio::spawn(async move {
            handler
                .handle(
                    &customer,
                    RedeemVoucherCommand {
                        voucher_id: voucher.id,
                        order_amount: 5_000,
                    },
                )
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let ok: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(ok.len(), 3);
    assert!(ok.iter().all(|r| r.discount_amount == Money::from_cents(500)));
    let mut counts: Vec<u32> = ok.iter().map(|r| r.used_count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3]);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::MaxUsesReached);
    }
    assert_eq!(count_audits(&store, AuditAction::VoucherRedeemed).await, 3);

    let stored = VoucherRepository::find(&store, tenant_id, voucher.id)
        .await
        .unwrap()
        .unwrap();
    let rows = VoucherRepository::redemptions(&store, tenant_id, voucher.id)
        .await
        .unwrap();
    assert_eq!(stored.used_count, 3);
    assert_eq!(rows.len(), stored.used_count as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_credits_are_consumed_exactly_once_each() {
    let store = InMemoryStore::new();
    let tenant_id = tenant(&store).await;
    let admin = TenantContext::new(tenant_id, UserId::new(), Role::Admin);
    let client = UserId::new();

    let package = CreatePackageHandler::new(Arc::new(store.clone()))
        .handle(
            &admin,
            CreatePackageCommand {
                name: "Two pack".to_string(),
                session_count: 2,
                price: 12_000,
                validity_days: None,
            },
        )
        .await
        .unwrap();
    let credit = GrantCreditHandler::new(Arc::new(store.clone()))
        .handle(
            &admin,
            GrantCreditCommand {
                package_id: package.id,
                client_id: client,
            },
        )
        .await
        .unwrap();
    let handler = Arc::new(LogSessionHandler::new(Arc::new(store.clone()), notifier()));

    let attempts = (0..5).map(|_| {
        let handler = handler.clone();
        tokio::spawn(async move {
            handler
                .handle(
                    &admin,
                    NewSessionLog {
                        client_id: client,
                        coach_id: admin.user_id,
                        credit_id: Some(credit.id),
                        booking_id: None,
                        session_date: Timestamp::now(),
                        duration_minutes: Some(60),
                        notes: None,
                    },
                )
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::CreditsExhausted);
    }
    assert_eq!(store.session_logs().await.len(), 2);
    assert_eq!(count_audits(&store, AuditAction::SessionLogged).await, 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever the order of redemptions, the card ends at the initial
    /// balance minus the accepted amounts, and only overdrafts are refused.
    #[test]
    fn redemption_sequences_conserve_value(
        initial in 1i64..50_000,
        amounts in proptest::collection::vec(1i64..20_000, 1..12),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = InMemoryStore::new();
            let tenant_id = tenant(&store).await;
            let staff = TenantContext::new(tenant_id, UserId::new(), Role::Staff);
            let code = issue_card(&store, &staff, initial).await;
            let handler = RedeemGiftCardHandler::new(Arc::new(store.clone()), notifier());

            let mut expected = initial;
            let mut accepted = 0usize;
            for amount in amounts {
                let result = handler
                    .handle(
                        &staff,
                        RedeemGiftCardCommand {
                            code: code.clone(),
                            amount,
                            reference: None,
                        },
                    )
                    .await;
                match result {
                    Ok(redeemed) => {
                        prop_assert!(amount <= expected);
                        expected -= amount;
                        accepted += 1;
                        prop_assert_eq!(redeemed.card.current_balance, Money::from_cents(expected));
                        let depleted = redeemed.card.status == GiftCardStatus::Depleted;
                        prop_assert_eq!(depleted, expected == 0);
                    }
                    Err(err) => {
                        prop_assert!(amount > expected);
                        let expected_code = if expected == 0 {
                            ErrorCode::InvalidStateTransition
                        } else {
                            ErrorCode::InsufficientBalance
                        };
                        prop_assert_eq!(err.code(), expected_code);
                    }
                }
            }

            prop_assert_eq!(count_audits(&store, AuditAction::GiftCardRedeemed).await, accepted);
            Ok(())
        })?;
    }
}
