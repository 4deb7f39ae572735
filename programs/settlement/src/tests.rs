//! Scenario tests for the settlement ledger
//!
//! Each scenario drives the public entry points with real curve arithmetic,
//! real Merkle trees and a stand-in for the succinct proof verifier.

#[cfg(test)]
mod unit_tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::config::{ConfigError, LedgerConfig};
    use crate::crypto::address::{encode_address, AddressKind, MoneroAddress, Network};
    use crate::crypto::curve::EdwardsPoint;
    use crate::crypto::dleq;
    use crate::crypto::encoding::{ByteOrder, EncodedScalar};
    use crate::crypto::field::{Scalar, SecretScalar};
    use crate::crypto::hash::keccak256;
    use crate::crypto::keys::AddressKeys;
    use crate::crypto::merkle::{output_tree, OutputRecord, TxTreeConvention};
    use crate::crypto::stealth::{self, encrypt_amount, PointProof, StealthOutput};
    use crate::error::*;
    use crate::instructions::MintRequest;
    use crate::ledger::{Ledger, LedgerEvent};
    use crate::state::*;
    use crate::zk::{expected_signals, AttestedProofVerifier, PlonkProof, ProofVerifier, PublicSignals};

    const T0: u64 = 1_700_000_000;
    /// 1.00 USD at 8 decimals
    const PRICE: u128 = 100_000_000;
    const XMR: u128 = 1_000_000_000_000;
    const DEPOSIT: u128 = 1_000_000_000_000_000;
    const HEIGHT: u64 = 3_100_000;
    /// View and spend secrets of the LP's Monero wallet
    const LP_WALLET: (u64, u64) = (0x1d2c_3b4a, 0x5e6f_7081);
    const USER_WALLET: (u64, u64) = (0x0bad_cafe, 0x0dec_0de5);

    type AcceptAll = fn(&PlonkProof, &PublicSignals) -> bool;
    type TestLedger<V> = Ledger<RelayBlockCache, SmoothedPriceFeed, V>;

    fn accept_all(_: &PlonkProof, _: &PublicSignals) -> bool {
        true
    }

    fn lp() -> Address {
        Address::from_label("lp")
    }

    fn user() -> Address {
        Address::from_label("user")
    }

    fn relay() -> Address {
        Address::from_label("relay")
    }

    fn feed() -> Address {
        Address::from_label("feed")
    }

    /// Public view and spend keys of a wallet
    fn wallet((view_secret, spend_secret): (u64, u64)) -> (EdwardsPoint, EdwardsPoint) {
        (
            EdwardsPoint::mul_base(&Scalar::from_u64(view_secret)),
            EdwardsPoint::mul_base(&Scalar::from_u64(spend_secret)),
        )
    }

    fn address_of(wallet_secrets: (u64, u64), network: Network) -> String {
        let (view, spend) = wallet(wallet_secrets);
        encode_address(network, &spend.compress(), &view.compress())
    }

    /// The LP's deposit address
    fn destination() -> String {
        address_of(LP_WALLET, Network::Mainnet)
    }

    /// Where the user wants burned tokens paid out
    fn user_destination() -> String {
        address_of(USER_WALLET, Network::Mainnet)
    }

    fn at(caller: Address, now: u64) -> CallContext {
        CallContext::new(caller, now)
    }

    /// Collateral in whole units and quotes taken without smoothing, so one
    /// collateral unit is worth exactly one XMR at `PRICE`
    fn config() -> LedgerConfig {
        LedgerConfig {
            collateral_decimals: 0,
            price_smoothing_bps: 10_000,
            ..Default::default()
        }
    }

    fn ledger_with<V: ProofVerifier>(verifier: V) -> TestLedger<V> {
        let mut ledger = Ledger::with_feeds(config(), relay(), feed(), verifier).unwrap();

        ledger.update_price(&at(feed(), T0), PRICE, PRICE, T0).unwrap();
        ledger.fund(&lp(), Asset::Collateral, 100).unwrap();
        ledger.fund(&user(), Asset::Native, 10 * DEPOSIT).unwrap();
        ledger.register_lp(&at(lp(), T0), 50, 30, destination()).unwrap();
        ledger.deposit_collateral(&at(lp(), T0), 10).unwrap();
        ledger
    }

    fn ledger() -> TestLedger<AcceptAll> {
        ledger_with(accept_all as AcceptAll)
    }

    fn open_intent<V: ProofVerifier>(ledger: &mut TestLedger<V>, amount: u128, now: u64) -> [u8; 32] {
        ledger
            .create_mint_intent(&at(user(), now).with_value(DEPOSIT), &lp(), amount)
            .unwrap()
    }

    /// A Monero payment and the mint call built from it
    struct Payment {
        request: MintRequest,
        tx_root: [u8; 32],
        output_root: [u8; 32],
    }

    /// Payment to the LP's deposit address
    fn pay(amount: u64, intent_id: [u8; 32], height: u64) -> Payment {
        let (view, spend) = wallet(LP_WALLET);
        pay_to(&view, &spend, amount, intent_id, height)
    }

    fn pay_to(view: &EdwardsPoint, spend: &EdwardsPoint, amount: u64, intent_id: [u8; 32], height: u64) -> Payment {
        let order = ByteOrder::BigEndian;
        let mut rng = StdRng::seed_from_u64(height);
        let tx_secret = SecretScalar::random(&mut rng);
        let output_index = 1;
        let derived = StealthOutput::derive(&tx_secret, view, spend, output_index);

        let tx_hash = keccak256(&height.to_le_bytes());
        let output = OutputRecord {
            tx_hash,
            output_index,
            ecdh_amount: encrypt_amount(amount, &derived.amount_key),
            output_pub_key: derived.output_key.compress(),
            commitment: keccak256(b"pedersen commitment"),
        };
        let change = OutputRecord {
            output_index: 0,
            output_pub_key: EdwardsPoint::mul_base(&Scalar::from_u64(99)).compress(),
            ..output
        };

        let convention = TxTreeConvention::default();
        let tx_tree = convention.build(&[0xaa; 32], &[[0x11; 32], tx_hash, [0x33; 32]]);
        let tx_proof = tx_tree.proof(convention.leaf_index(1)).unwrap();
        let outputs = output_tree(&[change, output]);
        let output_proof = outputs.proof(1).unwrap();

        let (dleq_statement, dleq_proof) = dleq::prove(&mut rng, &tx_secret, view, order);
        let points = PointProof::from_output(&derived, spend, order);
        let verified = dleq::verify(&dleq_statement, &dleq_proof, order).unwrap();
        let replayed =
            stealth::replay(&verified, &points, output_index, &output.output_pub_key, order).unwrap();

        Payment {
            request: MintRequest {
                intent_id,
                lp: lp(),
                recipient: user(),
                block_height: height,
                tx_hash,
                tx_proof,
                output,
                output_proof,
                dleq_statement,
                dleq_proof,
                points,
                proof: PlonkProof([[0x5a; 32]; 24]),
                signals: expected_signals(amount, &output, &replayed),
            },
            tx_root: tx_tree.root(),
            output_root: outputs.root(),
        }
    }

    fn post<V: ProofVerifier>(ledger: &mut TestLedger<V>, payment: &Payment, now: u64) {
        ledger
            .post_block(
                &at(relay(), now),
                payment.request.block_height,
                keccak256(b"block"),
                payment.tx_root,
                payment.output_root,
            )
            .unwrap();
    }

    fn minted(amount: u64) -> (TestLedger<AcceptAll>, Payment) {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, u128::from(amount), T0);
        let payment = pay(amount, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);
        ledger.mint(&at(user(), T0 + 60), &payment.request).unwrap();
        (ledger, payment)
    }

    fn assert_supply_backed<V: ProofVerifier>(ledger: &TestLedger<V>) {
        assert_eq!(ledger.total_supply(), ledger.total_backed());
    }

    // ==================== Capacity Tests ====================

    #[test]
    fn test_ten_collateral_backs_six_but_not_seven() {
        let mut ledger = ledger();
        let capacity = ledger.lp_capacity(&lp(), T0).unwrap();
        assert_eq!(capacity.max_backed, 6_666_666_666_666);

        let err = ledger
            .create_mint_intent(&at(user(), T0).with_value(DEPOSIT), &lp(), 7 * XMR)
            .unwrap_err();
        assert_eq!(
            err,
            SettlementError::Precondition(PreconditionError::InsufficientCapacity {
                requested: 7 * XMR,
                available: 6_666_666_666_666,
            })
        );
        assert!(err.is_retryable());

        open_intent(&mut ledger, 6 * XMR, T0);
        let capacity = ledger.lp_capacity(&lp(), T0).unwrap();
        assert_eq!(capacity.reserved, 6 * XMR);
        assert_eq!(capacity.available, 666_666_666_666);
    }

    #[test]
    fn test_intent_below_capacity_fraction_rejected() {
        let mut ledger = ledger();
        let err = ledger
            .create_mint_intent(&at(user(), T0).with_value(DEPOSIT), &lp(), XMR / 2)
            .unwrap_err();
        assert_eq!(
            err,
            SettlementError::Precondition(PreconditionError::IntentBelowMinimum {
                requested: XMR / 2,
                minimum: 666_666_666_666,
            })
        );
    }

    #[test]
    fn test_intent_needs_deposit() {
        let mut ledger = ledger();
        let err = ledger
            .create_mint_intent(&at(user(), T0).with_value(DEPOSIT - 1), &lp(), 2 * XMR)
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::Precondition(PreconditionError::DepositTooSmall { .. })
        ));
        assert_eq!(ledger.balance(&user(), Asset::Native), 10 * DEPOSIT);
    }

    #[test]
    fn test_stale_price_is_retryable() {
        let mut ledger = ledger();
        let err = ledger
            .create_mint_intent(&at(user(), T0 + 3_601).with_value(DEPOSIT), &lp(), 2 * XMR)
            .unwrap_err();
        assert_eq!(
            err,
            SettlementError::Precondition(PreconditionError::StalePrice { age: 3_601, max: 3_600 })
        );
        assert!(err.is_retryable());

        ledger
            .update_price(&at(feed(), T0 + 3_601), PRICE, PRICE, T0 + 3_600)
            .unwrap();
        open_intent(&mut ledger, 2 * XMR, T0 + 3_601);
    }

    #[test]
    fn test_inactive_lp_takes_no_intents() {
        let mut ledger = ledger();
        ledger
            .update_lp(
                &at(lp(), T0),
                LpUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        let err = ledger
            .create_mint_intent(&at(user(), T0).with_value(DEPOSIT), &lp(), 2 * XMR)
            .unwrap_err();
        assert_eq!(err, SettlementError::Precondition(PreconditionError::LpInactive));
    }

    // ==================== LP Lifecycle Tests ====================

    #[test]
    fn test_register_validates_inputs() {
        let mut ledger = ledger();
        let other = Address::from_label("other");
        assert_eq!(
            ledger.register_lp(&at(lp(), T0), 10, 10, destination()),
            Err(SettlementError::Precondition(PreconditionError::LpAlreadyRegistered))
        );
        assert_eq!(
            ledger.register_lp(&at(other, T0), 10_001, 10, destination()),
            Err(SettlementError::Precondition(PreconditionError::InvalidFee(10_001)))
        );
        assert_eq!(
            ledger.register_lp(&at(other, T0), 10, 10, "not-a-monero-address".to_string()),
            Err(SettlementError::Precondition(PreconditionError::InvalidDestination(
                AddressError::InvalidCharacter('-')
            )))
        );
        assert!(ledger.lp(&other).is_none());
    }

    #[test]
    fn test_register_rejects_addresses_that_cannot_take_deposits() {
        let mut ledger = ledger();
        let other = Address::from_label("other");
        assert_eq!(
            ledger.register_lp(&at(other, T0), 10, 10, address_of(LP_WALLET, Network::Stagenet)),
            Err(SettlementError::Precondition(PreconditionError::InvalidDestination(
                AddressError::WrongNetwork {
                    expected: Network::Mainnet,
                    found: Network::Stagenet,
                }
            )))
        );

        let (view, spend) = wallet(LP_WALLET);
        let subaddress = MoneroAddress {
            network: Network::Mainnet,
            kind: AddressKind::Subaddress,
            keys: AddressKeys::new(view.compress(), spend.compress()).unwrap(),
            payment_id: None,
        };
        assert_eq!(
            ledger.register_lp(&at(other, T0), 10, 10, subaddress.encode()),
            Err(SettlementError::Precondition(PreconditionError::InvalidDestination(
                AddressError::Subaddress
            )))
        );

        let integrated = MoneroAddress {
            kind: AddressKind::Integrated,
            payment_id: Some([7; 8]),
            ..subaddress
        };
        ledger.register_lp(&at(other, T0), 10, 10, integrated.encode()).unwrap();
        assert_eq!(ledger.lp(&other).unwrap().deposit_keys, subaddress.keys);
    }

    #[test]
    fn test_attached_value_rejected_where_not_expected() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.deposit_collateral(&at(lp(), T0).with_value(5), 1),
            Err(SettlementError::Precondition(PreconditionError::UnexpectedValue(5)))
        );
    }

    #[test]
    fn test_withdraw_limited_to_safe_ratio() {
        let (mut ledger, _) = minted(6 * XMR as u64);
        // 6 XMR at 150% needs 9 collateral units
        assert_eq!(
            ledger.withdraw_collateral(&at(lp(), T0 + 100), 2),
            Err(SettlementError::Precondition(PreconditionError::InsufficientCollateral {
                needed: 2,
                available: 1,
            }))
        );
        ledger.withdraw_collateral(&at(lp(), T0 + 100), 1).unwrap();
        assert_eq!(ledger.balance(&lp(), Asset::Collateral), 91);
        assert_eq!(ledger.lp(&lp()).unwrap().collateral, 9);
    }

    #[test]
    fn test_fee_schedule_follows_updates() {
        let mut ledger = ledger();
        ledger
            .update_lp(
                &at(lp(), T0),
                LpUpdate {
                    burn_fee_bps: Some(75),
                    ..Default::default()
                },
            )
            .unwrap();
        let fees = ledger.fee_schedule(&lp()).unwrap();
        assert_eq!(fees.mint_fee_bps, 50);
        assert_eq!(fees.burn_fee_bps, 75);
    }

    // ==================== Mint Tests ====================

    #[test]
    fn test_honest_mint() {
        let (ledger, payment) = minted(2 * XMR as u64);
        let fee = 2 * XMR * 50 / 10_000;

        assert_eq!(ledger.balance(&user(), Asset::Token), 2 * XMR - fee);
        assert_eq!(ledger.balance(&lp(), Asset::Token), fee);
        assert_eq!(ledger.balance(&user(), Asset::Native), 10 * DEPOSIT);
        assert_eq!(ledger.total_supply(), 2 * XMR);
        assert_supply_backed(&ledger);

        let record = ledger.lp(&lp()).unwrap();
        assert_eq!(record.backed_amount, 2 * XMR);
        assert_eq!(record.reserved_amount, 0);

        let intent = ledger.intent(&payment.request.intent_id).unwrap();
        assert_eq!(intent.status, IntentStatus::Fulfilled);
        assert!(ledger.is_spent(&payment.request.tx_hash, 1));
        assert!(!ledger.is_spent(&payment.request.tx_hash, 0));
        assert!(matches!(
            ledger.events().last(),
            Some(LedgerEvent::Minted { amount, fee: paid, .. }) if *amount == 2 * XMR && *paid == fee
        ));
    }

    #[test]
    fn test_nullifier_replay_is_attack() {
        let (mut ledger, payment) = minted(2 * XMR as u64);
        let second = open_intent(&mut ledger, 2 * XMR, T0 + 120);
        let before = ledger.state.clone();

        let mut replay = payment.request.clone();
        replay.intent_id = second;
        let err = ledger.mint(&at(user(), T0 + 180), &replay).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::Invariant(InvariantViolation::NullifierReplay { output_index: 1, .. })
        ));
        assert!(err.is_attack_signal());
        assert_eq!(ledger.state, before);
        assert_eq!(ledger.total_supply(), 2 * XMR);
    }

    #[test]
    fn test_mint_rejects_payment_to_other_wallet() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let (view, spend) = wallet(USER_WALLET);
        let payment = pay_to(&view, &spend, 2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);
        let before = ledger.state.clone();

        let err = ledger.mint(&at(user(), T0 + 60), &payment.request).unwrap_err();
        assert_eq!(err, SettlementError::Proof(ProofError::LpViewKeyMismatch));
        assert!(!err.is_retryable());
        assert_eq!(ledger.state, before);
        assert_eq!(ledger.total_supply(), 0);
        assert!(!ledger.is_spent(&payment.request.tx_hash, 1));
    }

    #[test]
    fn test_mint_rejects_lp_view_key_with_foreign_spend_key() {
        // Scannable by the LP, spendable only by the payer
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let (lp_view, _) = wallet(LP_WALLET);
        let (_, user_spend) = wallet(USER_WALLET);
        let payment = pay_to(&lp_view, &user_spend, 2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);
        let before = ledger.state.clone();

        assert_eq!(
            ledger.mint(&at(user(), T0 + 60), &payment.request),
            Err(SettlementError::Proof(ProofError::LpSpendKeyMismatch))
        );
        assert_eq!(ledger.state, before);
    }

    #[test]
    fn test_destination_update_rebinds_deposits() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);

        let moved = (0x7777, 0x8888);
        ledger
            .update_lp(
                &at(lp(), T0 + 40),
                LpUpdate {
                    destination: Some(address_of(moved, Network::Mainnet)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            ledger.mint(&at(user(), T0 + 60), &payment.request),
            Err(SettlementError::Proof(ProofError::LpViewKeyMismatch))
        );

        let (view, spend) = wallet(moved);
        let repaid = pay_to(&view, &spend, 2 * XMR as u64, id, HEIGHT + 1);
        post(&mut ledger, &repaid, T0 + 70);
        ledger.mint(&at(user(), T0 + 80), &repaid.request).unwrap();
        assert_eq!(ledger.total_supply(), 2 * XMR);
    }

    #[test]
    fn test_missing_block_is_retryable() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let payment = pay(2 * XMR as u64, id, HEIGHT);

        let err = ledger.mint(&at(user(), T0 + 60), &payment.request).unwrap_err();
        assert_eq!(err, SettlementError::Precondition(PreconditionError::MissingBlock(HEIGHT)));
        assert!(err.is_retryable());

        post(&mut ledger, &payment, T0 + 90);
        ledger.mint(&at(user(), T0 + 120), &payment.request).unwrap();
    }

    #[test]
    fn test_tx_path_mismatch_rejected() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let mut payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);
        let before = ledger.state.clone();

        payment.request.tx_proof.index = 0;
        let err = ledger.mint(&at(user(), T0 + 60), &payment.request).unwrap_err();
        assert_eq!(err, SettlementError::Proof(ProofError::TxInclusion));
        assert!(!err.is_retryable());
        assert_eq!(ledger.state, before);
    }

    #[test]
    fn test_substituted_output_key_rejected() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let mut payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);

        payment.request.output.output_pub_key = EdwardsPoint::mul_base(&Scalar::from_u64(7)).compress();
        assert_eq!(
            ledger.mint(&at(user(), T0 + 60), &payment.request),
            Err(SettlementError::Proof(ProofError::OutputInclusion))
        );
    }

    #[test]
    fn test_forged_dleq_response_rejected() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let mut payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);

        payment.request.dleq_proof.s = EncodedScalar::encode(&Scalar::from_u64(5), ByteOrder::BigEndian);
        assert_eq!(
            ledger.mint(&at(user(), T0 + 60), &payment.request),
            Err(SettlementError::Proof(ProofError::DleqBaseEquation))
        );
    }

    #[test]
    fn test_signal_for_other_output_rejected() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let mut payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);

        let mut words = payment.request.signals.words().to_vec();
        words[1] = [0x01; 32];
        payment.request.signals = PublicSignals::new(words).unwrap();
        assert_eq!(
            ledger.mint(&at(user(), T0 + 60), &payment.request),
            Err(SettlementError::Proof(ProofError::SignalMismatch(SignalField::Commitment)))
        );
    }

    #[test]
    fn test_amount_must_match_intent() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let payment = pay(3 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);

        let err = ledger.mint(&at(user(), T0 + 60), &payment.request).unwrap_err();
        assert_eq!(err, SettlementError::Proof(ProofError::IntentMismatch));
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_attested_verifier_gates_mint() {
        let attester = Address::from_label("prover");
        let mut ledger = ledger_with(AttestedProofVerifier::new(attester));
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);

        assert_eq!(
            ledger.mint(&at(user(), T0 + 60), &payment.request),
            Err(SettlementError::Proof(ProofError::SuccinctProofRejected))
        );

        let request = &payment.request;
        assert_eq!(
            ledger
                .verifier_mut()
                .attest(&user(), &request.proof, &request.signals),
            Err(PreconditionError::Unauthorized)
        );
        ledger
            .verifier_mut()
            .attest(&attester, &request.proof, &request.signals)
            .unwrap();
        let receipt = ledger.mint(&at(user(), T0 + 90), request).unwrap();
        assert_eq!(receipt.amount, 2 * XMR);
    }

    #[test]
    fn test_expired_intent_cannot_mint() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);

        assert_eq!(
            ledger.mint(&at(user(), T0 + 7_200), &payment.request),
            Err(SettlementError::Precondition(PreconditionError::IntentExpired))
        );
    }

    // ==================== Ratio Tests ====================

    #[test]
    fn test_mint_rechecks_ratio_at_issuance() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 6 * XMR, T0);
        let payment = pay(6 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 10);
        ledger
            .update_price(&at(feed(), T0 + 30), 120_000_000, PRICE, T0 + 30)
            .unwrap();
        let before = ledger.state.clone();

        assert_eq!(
            ledger.mint(&at(user(), T0 + 60), &payment.request),
            Err(SettlementError::Precondition(PreconditionError::RatioTooLow {
                ratio_bps: 13_888,
                required_bps: 15_000,
            }))
        );
        assert_eq!(ledger.state, before);
    }

    #[test]
    fn test_ratio_after_mint_at_or_above_safe() {
        let (ledger, _) = minted(6 * XMR as u64);
        let ratio = ledger.collateral_ratio_bps(&lp(), T0 + 60).unwrap().unwrap();
        assert!(ratio >= 15_000);
        assert_eq!(ledger.lp_health(&lp(), T0 + 60).unwrap(), LpHealth::Healthy);
    }

    // ==================== Intent Lifecycle Tests ====================

    #[test]
    fn test_cancel_after_timeout_refunds_deposit() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        assert_eq!(ledger.balance(&user(), Asset::Native), 9 * DEPOSIT);

        assert_eq!(
            ledger.cancel_mint_intent(&at(user(), T0 + 100), &id),
            Err(SettlementError::Precondition(PreconditionError::IntentNotExpired))
        );
        assert_eq!(
            ledger.cancel_mint_intent(&at(lp(), T0 + 7_200), &id),
            Err(SettlementError::Precondition(PreconditionError::Unauthorized))
        );

        ledger.cancel_mint_intent(&at(user(), T0 + 7_200), &id).unwrap();
        assert_eq!(ledger.balance(&user(), Asset::Native), 10 * DEPOSIT);
        assert_eq!(ledger.lp(&lp()).unwrap().reserved_amount, 0);
        assert_eq!(ledger.intent(&id).unwrap().status, IntentStatus::Cancelled);

        assert_eq!(
            ledger.cancel_mint_intent(&at(user(), T0 + 7_300), &id),
            Err(SettlementError::Invariant(InvariantViolation::IntentClosed))
        );
    }

    #[test]
    fn test_cancelled_intent_cannot_mint() {
        let mut ledger = ledger();
        let id = open_intent(&mut ledger, 2 * XMR, T0);
        let payment = pay(2 * XMR as u64, id, HEIGHT);
        post(&mut ledger, &payment, T0 + 30);
        ledger.cancel_mint_intent(&at(user(), T0 + 7_200), &id).unwrap();

        assert_eq!(
            ledger.mint(&at(user(), T0 + 7_260), &payment.request),
            Err(SettlementError::Invariant(InvariantViolation::IntentClosed))
        );
    }

    // ==================== Burn Tests ====================

    #[test]
    fn test_burn_fulfilled_then_second_fulfil_is_attack() {
        let (mut ledger, _) = minted(2 * XMR as u64);
        let id = ledger
            .request_burn(&at(user(), T0 + 100).with_value(DEPOSIT), &lp(), XMR, user_destination())
            .unwrap();

        let burn = ledger.burn(id).unwrap().clone();
        let fee = XMR * 30 / 10_000;
        assert_eq!(burn.fee, fee);
        // 0.997 XMR at 150% rounds up to 2 collateral units
        assert_eq!(burn.collateral_locked, 2);
        assert_eq!(ledger.lp(&lp()).unwrap().locked_collateral, 2);
        assert_eq!(ledger.total_supply(), 2 * XMR - (XMR - fee));
        assert_supply_backed(&ledger);

        assert_eq!(
            ledger.fulfill_burn(&at(user(), T0 + 200), id, [7; 32]),
            Err(SettlementError::Precondition(PreconditionError::Unauthorized))
        );
        ledger.fulfill_burn(&at(lp(), T0 + 200), id, [7; 32]).unwrap();
        assert_eq!(ledger.lp(&lp()).unwrap().locked_collateral, 0);
        assert_eq!(ledger.lp(&lp()).unwrap().collateral, 10);
        assert_eq!(ledger.balance(&user(), Asset::Native), 10 * DEPOSIT);
        assert_eq!(ledger.burn(id).unwrap().fulfilment_tx, Some([7; 32]));

        let before = ledger.state.clone();
        let err = ledger.fulfill_burn(&at(lp(), T0 + 300), id, [7; 32]).unwrap_err();
        assert_eq!(err, SettlementError::Invariant(InvariantViolation::BurnAlreadySettled(id)));
        assert!(err.is_attack_signal());
        assert_eq!(ledger.state, before);
    }

    #[test]
    fn test_burn_default_after_timeout() {
        let (mut ledger, _) = minted(2 * XMR as u64);
        let id = ledger
            .request_burn(&at(user(), T0 + 100).with_value(DEPOSIT), &lp(), XMR, user_destination())
            .unwrap();
        let deadline = T0 + 100 + 48 * 3_600;

        assert_eq!(
            ledger.claim_default(&at(user(), deadline), id),
            Err(SettlementError::Precondition(PreconditionError::BurnNotExpired(id)))
        );
        assert_eq!(ledger.claim_default(&at(user(), deadline + 1), id), Ok(2));

        assert_eq!(ledger.balance(&user(), Asset::Collateral), 2);
        assert_eq!(ledger.balance(&user(), Asset::Native), 10 * DEPOSIT);
        let record = ledger.lp(&lp()).unwrap();
        assert_eq!(record.collateral, 8);
        assert_eq!(record.locked_collateral, 0);
        assert_eq!(ledger.burn(id).unwrap().status, BurnStatus::Defaulted);

        assert_eq!(
            ledger.fulfill_burn(&at(lp(), deadline + 2), id, [7; 32]),
            Err(SettlementError::Invariant(InvariantViolation::BurnAlreadySettled(id)))
        );
        assert_supply_backed(&ledger);
    }

    #[test]
    fn test_late_fulfil_rejected() {
        let (mut ledger, _) = minted(2 * XMR as u64);
        let id = ledger
            .request_burn(&at(user(), T0 + 100).with_value(DEPOSIT), &lp(), XMR, user_destination())
            .unwrap();
        assert_eq!(
            ledger.fulfill_burn(&at(lp(), T0 + 101 + 48 * 3_600), id, [7; 32]),
            Err(SettlementError::Precondition(PreconditionError::BurnExpired(id)))
        );
    }

    #[test]
    fn test_burn_requires_balance() {
        let (mut ledger, _) = minted(2 * XMR as u64);
        let err = ledger
            .request_burn(&at(user(), T0 + 100).with_value(DEPOSIT), &lp(), 2 * XMR, user_destination())
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::Precondition(PreconditionError::InsufficientBalance { asset: Asset::Token, .. })
        ));
        assert_eq!(ledger.balance(&user(), Asset::Native), 10 * DEPOSIT);
    }

    // ==================== Liquidation Tests ====================

    #[test]
    fn test_liquidation_claim_and_redeem() {
        let (mut ledger, _) = minted(6 * XMR as u64);
        let liquidator = Address::from_label("liquidator");
        ledger.fund(&liquidator, Asset::Collateral, 5).unwrap();

        assert_eq!(
            ledger.liquidate(&at(liquidator, T0 + 90), &lp(), 2),
            Err(SettlementError::Precondition(PreconditionError::LpHealthy))
        );

        ledger
            .update_price(&at(feed(), T0 + 100), 120_000_000, PRICE, T0 + 100)
            .unwrap();
        assert_eq!(ledger.lp_health(&lp(), T0 + 100).unwrap(), LpHealth::UnderCollateralized);

        assert_eq!(ledger.liquidate(&at(liquidator, T0 + 110), &lp(), 2), Ok(2));
        assert_eq!(ledger.lp(&lp()).unwrap().collateral, 12);
        assert_eq!(ledger.lp_health(&lp(), T0 + 110).unwrap(), LpHealth::Healthy);

        // 6 XMR at 1.2 needs 11 units; the rest is owed to the liquidator
        assert!(matches!(
            ledger.withdraw_collateral(&at(lp(), T0 + 115), 1),
            Err(SettlementError::Precondition(PreconditionError::InsufficientCollateral { available: 0, .. }))
        ));

        assert_eq!(ledger.redeem_liquidation_claim(&at(liquidator, T0 + 120), &lp()), Ok(1));
        assert_eq!(ledger.liquidation_claim(&lp(), &liquidator), 1);
        assert_eq!(ledger.balance(&liquidator, Asset::Collateral), 4);
        assert_eq!(ledger.lp(&lp()).unwrap().collateral, 11);
        assert_eq!(ledger.lp_snapshot(&lp(), T0 + 120).unwrap().claims, 1);
    }

    #[test]
    fn test_deep_undercollateralization_is_liquidatable() {
        let (mut ledger, _) = minted(6 * XMR as u64);
        ledger
            .update_price(&at(feed(), T0 + 100), 150_000_000, PRICE, T0 + 100)
            .unwrap();
        assert_eq!(ledger.lp_health(&lp(), T0 + 100).unwrap(), LpHealth::Liquidatable);
        assert_eq!(ledger.collateral_ratio_bps(&lp(), T0 + 100).unwrap(), Some(11_111));
    }

    #[test]
    fn test_redeem_without_claim() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.redeem_liquidation_claim(&at(user(), T0), &lp()),
            Err(SettlementError::Precondition(PreconditionError::NoLiquidationClaim))
        );
    }

    // ==================== Price Feed Tests ====================

    #[test]
    fn test_ledger_feed_smooths_per_config() {
        let smoothed = LedgerConfig {
            price_smoothing_bps: 5_000,
            ..config()
        };
        let mut ledger = Ledger::with_feeds(smoothed, relay(), feed(), accept_all as AcceptAll).unwrap();
        ledger.update_price(&at(feed(), T0), PRICE, PRICE, T0).unwrap();
        ledger
            .update_price(&at(feed(), T0 + 10), 3 * PRICE, PRICE, T0 + 10)
            .unwrap();
        assert_eq!(ledger.price().unwrap().base_usd, 2 * PRICE);

        let unsmoothed = LedgerConfig {
            price_smoothing_bps: 0,
            ..config()
        };
        assert!(matches!(
            Ledger::with_feeds(unsmoothed, relay(), feed(), accept_all as AcceptAll),
            Err(ConfigError::ZeroValue("price_smoothing_bps"))
        ));
    }

    // ==================== Guard Tests ====================

    #[test]
    fn test_reentrant_call_rejected_without_effect() {
        let mut ledger = ledger();
        let before = ledger.state.clone();
        let events = ledger.events().len();
        ledger.entered = true;

        let err = ledger.deposit_collateral(&at(lp(), T0), 5).unwrap_err();
        assert_eq!(err, SettlementError::Invariant(InvariantViolation::Reentrancy));
        assert_eq!(
            ledger.post_block(&at(relay(), T0), 1, [0; 32], [0; 32], [0; 32]),
            Err(SettlementError::Invariant(InvariantViolation::Reentrancy))
        );
        assert_eq!(ledger.state, before);
        assert_eq!(ledger.events().len(), events);
        assert!(ledger.block(1).is_none());
    }

    #[test]
    fn test_untrusted_block_writer() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.post_block(&at(user(), T0), 1, [0; 32], [0; 32], [0; 32]),
            Err(SettlementError::Precondition(PreconditionError::Unauthorized))
        );
        assert_eq!(ledger.latest_height(), None);
    }

    #[test]
    fn test_tokens_cannot_be_funded() {
        let mut ledger = ledger();
        assert!(ledger.fund(&user(), Asset::Token, 1).is_err());
        assert_eq!(ledger.total_supply(), 0);
    }
}
