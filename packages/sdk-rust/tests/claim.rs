mod common;

use std::sync::Arc;

use common::*;
use fee_claimer_sdk::{
    AccessList, AuthorizationBypass, ClaimBounds, CreatorClaimParams, Error, PartnerClaimParams,
    PositionClaimParams, ReadOnlyWallet, Role, Step, Wallet,
};
use pretty_assertions::assert_eq;
use solana_sdk::{pubkey::Pubkey, system_program};

fn bonding_curve(ledger: &FakeLedger, fee_claimer: Pubkey, creator: Pubkey) -> Pubkey {
    let base = put_mint(ledger, spl_token::ID);
    let quote = put_mint(ledger, spl_token_2022::ID);
    let mut curve = CurveFixture::new(fee_claimer, creator, base, quote);
    curve.partner_fees = (40, 400);
    curve.creator_fees = (10, 100);
    put_dbc_pool(ledger, &curve).0
}

#[tokio::test]
async fn partner_fee_is_claimed_by_the_fee_claimer() {
    let ledger = FakeLedger::new();
    let claimer = wallet();
    let pool = bonding_curve(&ledger, claimer.pubkey(), Pubkey::new_unique());
    let client = client(&ledger);

    let result = client
        .claim_partner_fee(&claimer, PartnerClaimParams { pool, ..Default::default() })
        .await
        .unwrap();

    assert_eq!(result.pool, pool);
    assert_eq!(result.claimant, claimer.pubkey());
    assert_eq!(result.position, None);
    assert_eq!(result.bounds, ClaimBounds::default());
    assert_eq!(ledger.calls("claim_trading_fee"), 1);

    let metrics = client.get_pool_fee_metrics(&pool).await.unwrap();
    assert_eq!(metrics.current.partner_base_fee, 0);
    assert_eq!(metrics.current.partner_quote_fee, 0);
    assert_eq!(metrics.current.creator_quote_fee, 100);
}

#[tokio::test]
async fn partner_fee_rejects_other_wallets_without_submitting() {
    let ledger = FakeLedger::new();
    let fee_claimer = Pubkey::new_unique();
    let pool = bonding_curve(&ledger, fee_claimer, Pubkey::new_unique());
    let intruder = wallet();

    let err = client(&ledger)
        .claim_partner_fee(&intruder, PartnerClaimParams { pool, ..Default::default() })
        .await
        .unwrap_err();

    match err {
        Error::Authorization { pool: p, expected, actual } => {
            assert_eq!(p, pool);
            assert_eq!(expected, Some(fee_claimer));
            assert_eq!(actual, intruder.pubkey());
        }
        other => panic!("expected Authorization, got {other:?}"),
    }
    assert!(ledger.submissions().is_empty());
}

#[tokio::test]
async fn skipped_check_leaves_the_decision_to_the_program() {
    let ledger = FakeLedger::new();
    let pool = bonding_curve(&ledger, Pubkey::new_unique(), Pubkey::new_unique());

    let err = client(&ledger)
        .claim_partner_fee(&wallet(), PartnerClaimParams {
            pool,
            bounds: None,
            bypass: AuthorizationBypass::Skip,
        })
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::Claim));
    assert!(matches!(err, Error::Submission { .. }));
    assert!(matches!(err.root_cause(), Error::Rpc(_)));
}

#[tokio::test]
async fn partner_fee_bounds_travel_with_the_claim() {
    let ledger = FakeLedger::new();
    let claimer = wallet();
    let pool = bonding_curve(&ledger, claimer.pubkey(), Pubkey::new_unique());
    let bounds = ClaimBounds { max_base_amount: 5, max_quote_amount: 50 };

    let result = client(&ledger)
        .claim_partner_fee(&claimer, PartnerClaimParams { pool, bounds: Some(bounds), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(result.bounds, bounds);
    let tx = &ledger.submissions()[0];
    let claim = tx.message.instructions.last().unwrap();
    assert_eq!(&claim.data[8..16], &5u64.to_le_bytes());
    assert_eq!(&claim.data[16..24], &50u64.to_le_bytes());
}

#[tokio::test]
async fn creator_fee_is_claimed() {
    let ledger = FakeLedger::new();
    let creator = wallet();
    let pool = bonding_curve(&ledger, Pubkey::new_unique(), creator.pubkey());
    let client = client(&ledger);

    let result = client
        .claim_creator_fee(&creator, CreatorClaimParams { pool, bounds: None })
        .await
        .unwrap();

    assert_eq!(result.claimant, creator.pubkey());
    assert_eq!(ledger.calls("claim_creator_trading_fee"), 1);
    let metrics = client.get_pool_fee_metrics(&pool).await.unwrap();
    assert_eq!(metrics.current.creator_base_fee, 0);
    assert_eq!(metrics.current.partner_base_fee, 40);
}

#[tokio::test]
async fn bonding_curve_claims_reject_constant_product_pools() {
    let ledger = FakeLedger::new();
    let (pool, _, _) = cp_amm_setup(&ledger);

    let err = client(&ledger)
        .claim_creator_fee(&wallet(), CreatorClaimParams { pool, bounds: None })
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::ResolvePool));
    assert!(matches!(err.root_cause(), Error::Validation(_)), "{err:?}");
    assert!(ledger.submissions().is_empty());
}

#[tokio::test]
async fn unsupported_mint_program_names_the_failing_step() {
    let ledger = FakeLedger::new();
    let creator = wallet();
    let base = put_mint(&ledger, spl_token::ID);
    let quote = put_mint(&ledger, system_program::ID);
    let curve = CurveFixture::new(Pubkey::new_unique(), creator.pubkey(), base, quote);
    let (pool, _) = put_dbc_pool(&ledger, &curve);

    let err = client(&ledger)
        .claim_creator_fee(&creator, CreatorClaimParams { pool, bounds: None })
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::ResolveTokenPrograms));
    assert!(err.to_string().contains("resolve token programs"), "{err}");
    match err.root_cause() {
        Error::UnsupportedMintProgram { mint, owner } => {
            assert_eq!(*mint, quote);
            assert_eq!(*owner, system_program::ID);
        }
        other => panic!("expected UnsupportedMintProgram, got {other:?}"),
    }
    assert!(ledger.submissions().is_empty());
}

#[tokio::test]
async fn position_fee_is_claimed_by_the_holder() {
    let ledger = FakeLedger::new();
    let (pool, _, _) = cp_amm_setup(&ledger);
    let owner = wallet();
    let position = put_position(&ledger, &pool, &owner.pubkey(), 1_000);
    let bounds = ClaimBounds { max_base_amount: 0, max_quote_amount: 0 };

    let result = client(&ledger)
        .claim_position_fee(&owner, PositionClaimParams { position: position.address, bounds: Some(bounds) })
        .await
        .unwrap();

    assert_eq!(result.position, Some(position.address));
    assert_eq!(result.pool, pool);
    assert_eq!(result.bounds, bounds);
    assert!(!result.signature.is_empty());
    assert_eq!(ledger.calls("claim_position_fee"), 1);
}

#[tokio::test]
async fn position_fee_requires_holding_the_nft() {
    let ledger = FakeLedger::new();
    let (pool, _, _) = cp_amm_setup(&ledger);
    let position = put_position(&ledger, &pool, &Pubkey::new_unique(), 1_000);

    let err = client(&ledger)
        .claim_position_fee(&wallet(), PositionClaimParams { position: position.address, bounds: None })
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), Error::NotFound { .. }), "{err:?}");
    assert!(ledger.submissions().is_empty());
}

#[tokio::test]
async fn access_list_gates_claims() {
    let ledger = FakeLedger::new();
    let claimer = wallet();
    let pool = bonding_curve(&ledger, claimer.pubkey(), Pubkey::new_unique());
    let list = AccessList::new([(claimer.pubkey(), vec![Role::Split])]);

    let err = client(&ledger)
        .with_access_list(Arc::new(list))
        .claim_partner_fee(&claimer, PartnerClaimParams { pool, ..Default::default() })
        .await
        .unwrap_err();

    match err {
        Error::AccessDenied { wallet, role } => {
            assert_eq!(wallet, claimer.pubkey());
            assert_eq!(role, "claim");
        }
        other => panic!("expected AccessDenied, got {other:?}"),
    }
    assert!(ledger.submissions().is_empty());
}

#[tokio::test]
async fn read_only_wallet_cannot_submit() {
    let ledger = FakeLedger::new();
    let creator = Pubkey::new_unique();
    let pool = bonding_curve(&ledger, Pubkey::new_unique(), creator);

    let err = client(&ledger)
        .claim_creator_fee(&ReadOnlyWallet::new(creator), CreatorClaimParams { pool, bounds: None })
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::Claim));
    assert!(matches!(err.root_cause(), Error::WalletNotCapable(_)));
}
