//! End-to-end repository/service tests against a real Postgres.
//!
//! Run with a database available:
//! `TEST_DATABASE_URL=postgresql://... cargo test -- --ignored`

mod helpers;

use helpers::*;
use rust_decimal::Decimal;
use tharwa_backend::models::*;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_deposit_withdraw_and_balance() {
    let db = TestDatabase::new().await;
    let owner = Payable::InvestorProfile(Uuid::new_v4());
    let wallet = &db.state.wallet_service;

    wallet
        .deposit(&owner, Decimal::new(1_000, 0), "initial top-up")
        .await
        .unwrap();
    wallet
        .withdraw(&owner, Decimal::new(250, 0), "test debit")
        .await
        .unwrap();

    let balance = wallet.balance(&owner).await.unwrap();
    assert_eq!(balance, Decimal::new(750, 0));

    let history = wallet.transactions(&owner, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(balance_of(&history), balance);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_withdraw_fails_on_insufficient_balance() {
    let db = TestDatabase::new().await;
    let owner = Payable::User(Uuid::new_v4());

    db.state
        .wallet_service
        .deposit(&owner, Decimal::new(100, 0), "seed")
        .await
        .unwrap();

    let err = db
        .state
        .wallet_service
        .withdraw(&owner, Decimal::new(101, 0), "too much")
        .await
        .unwrap_err();
    assert!(err.is_business_logic());
    assert_eq!(err.status_code(), 400);

    // The failed attempt must not write a ledger row
    let history = db.state.wallet_service.transactions(&owner, 10).await.unwrap();
    assert_eq!(history.len(), 1);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_invest_merges_and_tracks_funding() {
    let db = TestDatabase::new().await;
    let investor = Uuid::new_v4();
    let owner = Payable::InvestorProfile(investor);

    db.state
        .wallet_service
        .deposit(&owner, Decimal::new(60_000, 0), "funding")
        .await
        .unwrap();

    let opportunity = db
        .state
        .opportunity_repo
        .create(&open_opportunity(100_000, 1_000))
        .await
        .unwrap();

    let first = db
        .state
        .investment_service
        .invest(
            opportunity.id,
            investor,
            30,
            InvestmentType::Authorize,
            Decimal::new(50, 0),
        )
        .await
        .unwrap();
    assert_eq!(first.shares, 30);

    let mid = db
        .state
        .opportunity_repo
        .find_by_id(opportunity.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mid.reserved_shares, 30);
    assert_eq!(mid.completion_rate(), Decimal::new(30, 0));

    let second = db
        .state
        .investment_service
        .invest(
            opportunity.id,
            investor,
            20,
            InvestmentType::Authorize,
            Decimal::new(50, 0),
        )
        .await
        .unwrap();

    // Merged into one row
    assert_eq!(second.id, first.id);
    assert_eq!(second.shares, 50);
    assert_eq!(second.total_investment, Decimal::new(50_000, 0));

    let positions = db
        .state
        .investment_repo
        .list_by_opportunity(opportunity.id)
        .await
        .unwrap();
    assert_eq!(positions.len(), 1);

    let portfolio = db
        .state
        .investment_repo
        .list_by_investor(investor)
        .await
        .unwrap();
    assert_eq!(portfolio.len(), 1);

    // Wallet charged 50 000 across the two purchases
    let balance = db.state.wallet_service.balance(&owner).await.unwrap();
    assert_eq!(balance, Decimal::new(10_000, 0));

    // Admin lifecycle: the position moves pending -> active -> completed
    let active = db.state.investment_service.activate(first.id).await.unwrap();
    assert_eq!(active.status_enum(), InvestmentStatus::Active);
    let completed = db.state.investment_service.complete(first.id).await.unwrap();
    assert_eq!(completed.status_enum(), InvestmentStatus::Completed);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_over_reservation_is_rejected() {
    let db = TestDatabase::new().await;

    let opportunity = db
        .state
        .opportunity_repo
        .create(&open_opportunity(10_000, 1_000))
        .await
        .unwrap();

    db.state
        .opportunity_repo
        .reserve_shares(opportunity.id, 8)
        .await
        .unwrap();

    let err = db
        .state
        .opportunity_repo
        .reserve_shares(opportunity.id, 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        tharwa_backend::error::RepositoryError::BusinessRule(_)
    ));

    let unchanged = db
        .state
        .opportunity_repo
        .find_by_id(opportunity.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.reserved_shares, 8);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_withdrawal_rejection_refunds_once() {
    let db = TestDatabase::new().await;
    let owner = Payable::InvestorProfile(Uuid::new_v4());

    db.state
        .wallet_service
        .deposit(&owner, Decimal::new(500, 0), "seed")
        .await
        .unwrap();

    let request = db
        .state
        .withdrawal_service
        .request(&owner, Decimal::new(500, 0))
        .await
        .unwrap();
    assert!(request.money_withdrawn);
    assert_eq!(
        db.state.wallet_service.balance(&owner).await.unwrap(),
        Decimal::ZERO
    );

    let rejected = db
        .state
        .withdrawal_service
        .reject(request.id, Uuid::new_v4(), "invalid IBAN")
        .await
        .unwrap();
    assert!(!rejected.money_withdrawn);

    // Balance restored through exactly one refund deposit
    assert_eq!(
        db.state.wallet_service.balance(&owner).await.unwrap(),
        Decimal::new(500, 0)
    );
    let history = db.state.wallet_service.transactions(&owner, 10).await.unwrap();
    assert_eq!(history.len(), 3);

    let requests = db
        .state
        .withdrawal_repo
        .list_for_payable(&owner)
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_admin_transition_and_rejection_refund_once() {
    let db = TestDatabase::new().await;
    let owner = Payable::InvestorProfile(Uuid::new_v4());
    let admin = Uuid::new_v4();

    db.state
        .wallet_service
        .deposit(&owner, Decimal::new(500, 0), "seed")
        .await
        .unwrap();

    let request = db
        .state
        .withdrawal_service
        .request(&owner, Decimal::new(500, 0))
        .await
        .unwrap();

    // Both transitions race for the same row lock. Whichever order the
    // database serializes them in, the rejection is legal (pending ->
    // rejected or processing -> rejected) and the refund happens once.
    let (processing, rejected) = tokio::join!(
        db.state.withdrawal_service.begin_processing(request.id, admin),
        db.state
            .withdrawal_service
            .reject(request.id, admin, "invalid IBAN"),
    );
    assert!(rejected.is_ok());
    if let Ok(mid) = processing {
        assert_eq!(mid.status_enum(), WithdrawalStatus::Processing);
    }

    let reloaded = db
        .state
        .withdrawal_repo
        .find_by_id(request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status_enum(), WithdrawalStatus::Rejected);
    assert!(!reloaded.money_withdrawn);

    assert_eq!(
        db.state.wallet_service.balance(&owner).await.unwrap(),
        Decimal::new(500, 0)
    );
    let history = db.state.wallet_service.transactions(&owner, 10).await.unwrap();
    assert_eq!(history.len(), 3);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_rejecting_an_approved_transfer_fails() {
    let db = TestDatabase::new().await;
    let owner = Payable::User(Uuid::new_v4());
    let admin = Uuid::new_v4();

    let request = db.state.bank_transfer_service.request(&owner).await.unwrap();
    db.state
        .bank_transfer_service
        .approve(request.id, admin, Uuid::new_v4(), "TRX-901", Decimal::new(750, 0))
        .await
        .unwrap();

    let err = db
        .state
        .bank_transfer_service
        .reject(request.id, admin, "duplicate slip")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    // The credited approval survives the failed rejection
    let reloaded = db
        .state
        .bank_transfer_repo
        .find_by_id(request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status_enum(), BankTransferStatus::Approved);
    assert_eq!(
        db.state.wallet_service.balance(&owner).await.unwrap(),
        Decimal::new(750, 0)
    );

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_merge_charges_at_the_frozen_position_price() {
    let db = TestDatabase::new().await;
    let investor = Uuid::new_v4();
    let owner = Payable::InvestorProfile(investor);

    db.state
        .wallet_service
        .deposit(&owner, Decimal::new(60_000, 0), "funding")
        .await
        .unwrap();

    let opportunity = db
        .state
        .opportunity_repo
        .create(&open_opportunity(100_000, 1_000))
        .await
        .unwrap();

    let first = db
        .state
        .investment_service
        .invest(
            opportunity.id,
            investor,
            30,
            InvestmentType::Authorize,
            Decimal::new(50, 0),
        )
        .await
        .unwrap();

    // The opportunity is repriced after the first purchase
    sqlx::query("UPDATE investment_opportunities SET share_price = $1 WHERE id = $2")
        .bind(Decimal::new(2_000, 0))
        .bind(opportunity.id)
        .execute(db.state.database.pool())
        .await
        .unwrap();

    let merged = db
        .state
        .investment_service
        .invest(
            opportunity.id,
            investor,
            20,
            InvestmentType::Authorize,
            Decimal::new(50, 0),
        )
        .await
        .unwrap();

    // The position keeps its original price, so the top-up is charged
    // at that price and the stored totals match the wallet debits
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.share_price, Decimal::new(1_000, 0));
    assert_eq!(merged.total_investment, Decimal::new(50_000, 0));
    assert_eq!(
        db.state.wallet_service.balance(&owner).await.unwrap(),
        Decimal::new(10_000, 0)
    );

    let reloaded = db
        .state
        .investment_repo
        .find_by_id(first.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.total_investment, Decimal::new(50_000, 0));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_unknown_status_values_are_rejected_by_the_schema() {
    let db = TestDatabase::new().await;
    let owner = Payable::InvestorProfile(Uuid::new_v4());

    db.state
        .wallet_service
        .deposit(&owner, Decimal::new(100, 0), "seed")
        .await
        .unwrap();
    let request = db
        .state
        .withdrawal_service
        .request(&owner, Decimal::new(100, 0))
        .await
        .unwrap();

    let err = sqlx::query("UPDATE withdrawal_requests SET status = 'garbage' WHERE id = $1")
        .bind(request.id)
        .execute(db.state.database.pool())
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_database_error().and_then(|e| e.code()).as_deref(),
        Some("23514")
    ));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_profit_distribution_credits_wallet() {
    let db = TestDatabase::new().await;
    let investor = Uuid::new_v4();
    let owner = Payable::InvestorProfile(investor);

    db.state
        .wallet_service
        .deposit(&owner, Decimal::new(40_000, 0), "funding")
        .await
        .unwrap();

    let opportunity = db
        .state
        .opportunity_repo
        .create(&open_opportunity(100_000, 1_000))
        .await
        .unwrap();

    let position = db
        .state
        .investment_service
        .invest(
            opportunity.id,
            investor,
            40,
            InvestmentType::Authorize,
            Decimal::new(25, 0),
        )
        .await
        .unwrap();

    db.state
        .investment_service
        .record_actual_returns(position.id, Decimal::new(30, 0))
        .await
        .unwrap();

    let distributed = db
        .state
        .investment_service
        .distribute_profit(position.id)
        .await
        .unwrap();
    assert_eq!(distributed.distributed_profit, Some(Decimal::new(1_200, 0)));

    // Second distribution must fail and not double anything
    let err = db
        .state
        .investment_service
        .distribute_profit(position.id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let balance = db.state.wallet_service.balance(&owner).await.unwrap();
    assert_eq!(balance, Decimal::new(1_200, 0));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_wallet_row_is_shared_per_owner() {
    let db = TestDatabase::new().await;
    let owner = Payable::OwnerProfile(Uuid::new_v4());

    let first = db.state.wallet_repo.get_or_create_wallet(&owner).await.unwrap();
    let second = db.state.wallet_repo.get_or_create_wallet(&owner).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.owner().unwrap(), owner);

    let found = db.state.wallet_repo.find_wallet(&owner).await.unwrap();
    assert_eq!(found.unwrap().id, first.id);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_open_listing_follows_status_and_visibility() {
    let db = TestDatabase::new().await;

    let visible = db
        .state
        .opportunity_repo
        .create(&open_opportunity(50_000, 500))
        .await
        .unwrap();
    db.state
        .opportunity_repo
        .create(&InvestmentOpportunity::new(
            "Draft opportunity".to_string(),
            Decimal::new(10_000, 0),
            Decimal::new(100, 0),
            Decimal::ZERO,
        ))
        .await
        .unwrap();

    let open = db.state.opportunity_repo.list_open().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, visible.id);

    db.state
        .opportunity_repo
        .set_status(visible.id, "suspended")
        .await
        .unwrap();
    assert!(db.state.opportunity_repo.list_open().await.unwrap().is_empty());

    let err = db
        .state
        .opportunity_repo
        .set_status(Uuid::new_v4(), "open")
        .await
        .map_err(tharwa_backend::AppError::from)
        .unwrap_err();
    assert!(err.is_not_found());

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_bank_transfer_approval_credits_wallet() {
    let db = TestDatabase::new().await;
    let owner = Payable::User(Uuid::new_v4());

    let request = db.state.bank_transfer_service.request(&owner).await.unwrap();

    let approved = db
        .state
        .bank_transfer_service
        .approve(
            request.id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "TRX-555",
            Decimal::new(2_000, 0),
        )
        .await
        .unwrap();
    assert_eq!(approved.status_enum(), BankTransferStatus::Approved);

    assert_eq!(
        db.state.wallet_service.balance(&owner).await.unwrap(),
        Decimal::new(2_000, 0)
    );

    db.cleanup().await;
}
