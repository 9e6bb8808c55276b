use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
mod tests {
    use crate::sctest::*;
    use crate::*;
    use concordium_std::test_infrastructure::*;
    use sale_utils::{RATE_WEEK1, RATE_WEEK3};

    #[concordium_test]
    /// A minimum contribution during the pre-sale credits the beneficiary
    /// at the pre-sale rate and forwards the full payment to the treasury.
    fn test_buy_during_presale() {
        let mut host = new_host();
        let value = min_contribution();
        let admin_stock_before = host.state().balance_of(&Address::Account(ADMIN_ACC));

        let (result, logger) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(RECEIVER_ACC),
            value,
            PRESALE_START + DAY,
        );
        claim!(result.is_ok(), "buy during the pre-sale should succeed");

        let expected_coins = value.micro_ccd * sale_utils::RATE_PRESALE;
        let state = host.state();
        claim_eq!(
            state.balance_of(&Address::Account(RECEIVER_ACC)).0,
            expected_coins,
            "beneficiary must be credited at the pre-sale rate"
        );
        claim_eq!(
            state.balance_of(&Address::Account(ADMIN_ACC)).0,
            admin_stock_before.0 - expected_coins,
            "coins must come out of the sale stock"
        );
        claim_eq!(state.total_sold.0, expected_coins);
        claim_eq!(state.total_raised, value);
        claim_eq!(state.contribution_of(&BUYER_ACC), value);
        // the buyer paid, the beneficiary holds the coins
        claim_eq!(state.contribution_of(&RECEIVER_ACC), Amount::zero());
        claim_eq!(sum_of_balances(state), TOTAL_SUPPLY);
        claim_eq!(
            host.get_transfers(),
            [(TREASURY_ACC, value)],
            "the full payment must reach the treasury"
        );
        claim_eq!(logger.logs.len(), 1, "one purchase event expected");
    }

    #[concordium_test]
    /// Purchases outside the pre-sale and sale windows reject.
    fn test_buy_rejects_outside_windows() {
        for slot in [PRESALE_START - 1, PRESALE_END, SALE_END] {
            let mut host = new_host();
            let (result, _) = call_buy(
                &mut host,
                BUYER_ACC,
                Address::Account(BUYER_ACC),
                min_contribution(),
                slot,
            );
            let err = result.expect_err_report("buy must reject outside the windows");
            claim_eq!(err, CustomContractError::PhaseClosed.into());
            claim_eq!(host.state().total_sold.0, 0);
            claim_eq!(host.get_transfers().len(), 0);
        }
    }

    #[concordium_test]
    /// The minimum applies to both purchase paths, the explicit `buy` and
    /// the bare `deposit` receipt.
    fn test_minimum_enforced_on_both_paths() {
        let mut host = new_host();
        let below = Amount::from_micro_ccd(MIN_CONTRIBUTION_MICRO_CCD - 1);

        let (result, _) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(BUYER_ACC),
            below,
            PRESALE_START + DAY,
        );
        claim_eq!(
            result.expect_err_report("buy below the minimum must reject"),
            CustomContractError::BelowMinimum.into()
        );

        let (result, _) = call_deposit(&mut host, BUYER_ACC, below, PRESALE_START + DAY);
        claim_eq!(
            result.expect_err_report("deposit below the minimum must reject"),
            CustomContractError::BelowMinimum.into()
        );

        claim_eq!(host.state().total_sold.0, 0);
        claim_eq!(host.state().contribution_of(&BUYER_ACC), Amount::zero());
    }

    #[concordium_test]
    /// A bare deposit is a purchase for the sender.
    fn test_deposit_buys_for_sender() {
        let mut host = new_host();
        let value = min_contribution();

        let (result, logger) = call_deposit(&mut host, BUYER_ACC, value, PRESALE_START + DAY);
        claim!(result.is_ok());

        let state = host.state();
        claim_eq!(
            state.balance_of(&Address::Account(BUYER_ACC)).0,
            value.micro_ccd * sale_utils::RATE_PRESALE
        );
        claim_eq!(state.contribution_of(&BUYER_ACC), value);
        claim_eq!(host.get_transfers(), [(TREASURY_ACC, value)]);
        claim_eq!(logger.logs.len(), 1);
    }

    #[concordium_test]
    /// Week three prices lower than week one.
    fn test_weekly_rates_differ() {
        let mut host = new_host();
        let value = min_contribution();

        let (result, _) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(BUYER_ACC),
            value,
            SALE_START + DAY,
        );
        claim!(result.is_ok());
        let week1_coins = host.state().balance_of(&Address::Account(BUYER_ACC)).0;
        claim_eq!(week1_coins, value.micro_ccd * RATE_WEEK1);

        let (result, _) = call_buy(
            &mut host,
            BUYER2_ACC,
            Address::Account(BUYER2_ACC),
            value,
            SALE_START + 2 * WEEK + DAY,
        );
        claim!(result.is_ok());
        let week3_coins = host.state().balance_of(&Address::Account(BUYER2_ACC)).0;
        claim_eq!(week3_coins, value.micro_ccd * RATE_WEEK3);

        claim!(week3_coins < week1_coins, "the rate must fall week by week");
    }

    #[concordium_test]
    /// A contribution past the pre-sale cap issues exactly the remaining
    /// headroom, refunds the excess and closes the phase.
    fn test_presale_cap_excess_refund() {
        let mut host = new_host();

        let cap_value =
            value_for_coins(sale_utils::PRESALE_HARDCAP.into(), sale_utils::RATE_PRESALE)
                .unwrap();
        let excess = Amount::from_micro_ccd(5_000_000);
        let value = cap_value + excess;

        let (result, _) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(BUYER_ACC),
            value,
            PRESALE_START + DAY,
        );
        claim!(result.is_ok(), "the capping purchase itself must succeed");

        let state = host.state();
        claim_eq!(
            state.balance_of(&Address::Account(BUYER_ACC)).0,
            sale_utils::PRESALE_HARDCAP,
            "exactly the headroom must be issued"
        );
        claim_eq!(
            state.total_sold.0,
            sale_utils::PRESALE_HARDCAP,
            "total sold must land exactly on the cap"
        );
        claim_eq!(state.total_raised, cap_value);
        claim_eq!(state.contribution_of(&BUYER_ACC), cap_value);
        claim_eq!(
            host.get_transfers(),
            [(TREASURY_ACC, cap_value), (BUYER_ACC, excess)],
            "treasury gets the capped value, the buyer the excess back"
        );
        claim_eq!(sum_of_balances(state), TOTAL_SUPPLY);

        // the phase is closed early even though time has not elapsed
        let (result, _) = call_buy(
            &mut host,
            BUYER2_ACC,
            Address::Account(BUYER2_ACC),
            min_contribution(),
            PRESALE_START + 2 * DAY,
        );
        claim_eq!(
            result.expect_err_report("the next pre-sale purchase must reject"),
            CustomContractError::CapReached.into()
        );
    }

    #[concordium_test]
    /// The sale weeks check the same counter against the sale cap.
    fn test_sale_cap_reached() {
        let mut host = new_host();
        host.state_mut().total_sold = sale_utils::SALE_HARDCAP.into();

        let (result, _) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(BUYER_ACC),
            min_contribution(),
            SALE_START + WEEK + DAY,
        );
        claim_eq!(
            result.expect_err_report("a sold out sale must reject"),
            CustomContractError::CapReached.into()
        );
    }

    #[concordium_test]
    /// Transfers open exactly 14 days after the sale end.
    fn test_transfer_gate_boundary() {
        let mut host = new_host();
        host.state_mut()
            .transfer_coins(
                &Address::Account(ADMIN_ACC),
                &Address::Account(BUYER_ACC),
                1_000u64.into(),
            )
            .unwrap_abort();

        let params_bytes = to_bytes(&TransferParams {
            to: Address::Account(RECEIVER_ACC),
            amount: 400u64.into(),
        });

        // one millisecond before the gate opens
        let mut ctx = receive_ctx(BUYER_ACC, SALE_END + 14 * DAY - 1);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("transfer before the gate must reject"),
            CustomContractError::TransfersLocked.into()
        );
        claim_eq!(host.state().balance_of(&Address::Account(RECEIVER_ACC)).0, 0);

        // at the boundary it goes through
        let mut ctx = receive_ctx(BUYER_ACC, SALE_END + 14 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "transfer at the boundary should succeed");

        let state = host.state();
        claim_eq!(state.balance_of(&Address::Account(BUYER_ACC)).0, 600);
        claim_eq!(state.balance_of(&Address::Account(RECEIVER_ACC)).0, 400);
        claim_eq!(sum_of_balances(state), TOTAL_SUPPLY);
        claim_eq!(logger.logs.len(), 1);
    }

    #[concordium_test]
    fn test_transfer_rejects_insufficient_balance() {
        let mut host = new_host();

        let params_bytes = to_bytes(&TransferParams {
            to: Address::Account(RECEIVER_ACC),
            amount: 1u64.into(),
        });
        let mut ctx = receive_ctx(BUYER_ACC, SALE_END + 15 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("an empty account cannot send"),
            ContractError::InsufficientFunds
        );
    }

    #[concordium_test]
    /// `approve` overwrites; `transferFrom` spends the allowance and is
    /// gated for everyone but the administrator.
    fn test_approve_and_transfer_from() {
        let mut host = new_host();
        host.state_mut()
            .transfer_coins(
                &Address::Account(ADMIN_ACC),
                &Address::Account(BUYER_ACC),
                1_000u64.into(),
            )
            .unwrap_abort();

        // approve works in any phase, and overwrites
        for (slot, amount) in [(T0 - 1, 100u64), (SALE_START + DAY, 40u64)] {
            let params_bytes = to_bytes(&ApproveParams {
                spender: Address::Account(BUYER2_ACC),
                amount: amount.into(),
            });
            let mut ctx = receive_ctx(BUYER_ACC, slot);
            ctx.set_parameter(&params_bytes);
            let mut logger = TestLogger::init();
            let result: ContractResult<()> = contract_approve(&ctx, &mut host, &mut logger);
            claim!(result.is_ok(), "approve should always succeed");
        }
        claim_eq!(
            host.state()
                .allowance(&Address::Account(BUYER_ACC), &Address::Account(BUYER2_ACC))
                .0,
            40,
            "a second approve replaces the allowance"
        );

        let transfer_bytes = to_bytes(&TransferFromParams {
            from: Address::Account(BUYER_ACC),
            to: Address::Account(RECEIVER_ACC),
            amount: 30u64.into(),
        });

        // a normal spender is still gated
        let mut ctx = receive_ctx(BUYER2_ACC, SALE_END + DAY);
        ctx.set_parameter(&transfer_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer_from(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("transferFrom before the gate must reject"),
            CustomContractError::TransfersLocked.into()
        );

        // after the gate the allowance is spent and decremented
        let mut ctx = receive_ctx(BUYER2_ACC, SALE_END + 14 * DAY);
        ctx.set_parameter(&transfer_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer_from(&ctx, &mut host, &mut logger);
        claim!(result.is_ok());
        claim_eq!(
            host.state()
                .allowance(&Address::Account(BUYER_ACC), &Address::Account(BUYER2_ACC))
                .0,
            10
        );
        claim_eq!(host.state().balance_of(&Address::Account(RECEIVER_ACC)).0, 30);

        // more than the remaining allowance
        let over_bytes = to_bytes(&TransferFromParams {
            from: Address::Account(BUYER_ACC),
            to: Address::Account(RECEIVER_ACC),
            amount: 11u64.into(),
        });
        let mut ctx = receive_ctx(BUYER2_ACC, SALE_END + 14 * DAY);
        ctx.set_parameter(&over_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer_from(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("overspending the allowance must reject"),
            CustomContractError::InsufficientAllowance.into()
        );
        claim_eq!(
            host.state()
                .allowance(&Address::Account(BUYER_ACC), &Address::Account(BUYER2_ACC))
                .0,
            10,
            "a rejected transferFrom leaves the allowance alone"
        );

        // an allowance larger than the owner balance does not help
        let params_bytes = to_bytes(&ApproveParams {
            spender: Address::Account(BUYER2_ACC),
            amount: 10_000u64.into(),
        });
        let mut ctx = receive_ctx(BUYER_ACC, SALE_END + 14 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_approve(&ctx, &mut host, &mut logger);
        claim!(result.is_ok());

        let drain_bytes = to_bytes(&TransferFromParams {
            from: Address::Account(BUYER_ACC),
            to: Address::Account(RECEIVER_ACC),
            amount: 2_000u64.into(),
        });
        let mut ctx = receive_ctx(BUYER2_ACC, SALE_END + 14 * DAY);
        ctx.set_parameter(&drain_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer_from(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("spending beyond the balance must reject"),
            ContractError::InsufficientFunds
        );
    }

    #[concordium_test]
    /// After a soft-cap miss each contributor gets their value back exactly
    /// once; the coins they bought stay put.
    fn test_claim_refund_exactly_once() {
        let mut host = new_host();
        let value = min_contribution() + min_contribution();

        let (result, _) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(BUYER_ACC),
            value,
            SALE_START + DAY,
        );
        claim!(result.is_ok());
        let coins_bought = host.state().balance_of(&Address::Account(BUYER_ACC));
        claim!(host.state().total_sold.0 < sale_utils::SALE_SOFTCAP);

        // the treasury returned the raised value for refunds
        host.set_self_balance(value);

        let ctx = receive_ctx(BUYER_ACC, SALE_END);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_claim_refund(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "an eligible refund should succeed");

        let state = host.state();
        claim_eq!(state.contribution_of(&BUYER_ACC), Amount::zero());
        claim_eq!(state.total_raised, Amount::zero());
        claim_eq!(
            state.balance_of(&Address::Account(BUYER_ACC)),
            coins_bought,
            "the refund pays value back, the coins stay"
        );
        claim_eq!(
            host.get_transfers(),
            [(TREASURY_ACC, value), (BUYER_ACC, value)],
            "the whole contribution must come back"
        );
        claim_eq!(logger.logs.len(), 1);

        // the second claim finds nothing owed and moves nothing
        let ctx = receive_ctx(BUYER_ACC, SALE_END + DAY);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_claim_refund(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "a repeat claim is a silent no-op");
        claim_eq!(host.get_transfers().len(), 2, "no second payout");
        claim_eq!(logger.logs.len(), 0);
    }

    #[concordium_test]
    fn test_claim_refund_not_eligible() {
        // still selling
        let mut host = new_host();
        let ctx = receive_ctx(BUYER_ACC, SALE_START + 3 * WEEK + DAY);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_claim_refund(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("refund before the sale end must reject"),
            CustomContractError::RefundNotEligible.into()
        );

        // ended, but the soft cap was reached
        let mut host = new_host();
        host.state_mut().total_sold = sale_utils::SALE_SOFTCAP.into();
        let ctx = receive_ctx(BUYER_ACC, SALE_END + DAY);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_claim_refund(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("refund above the soft cap must reject"),
            CustomContractError::RefundNotEligible.into()
        );
    }

    #[concordium_test]
    /// The coin supply is conserved across purchases and transfers.
    fn test_supply_invariant_over_sequence() {
        let mut host = new_host();

        let (result, _) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(BUYER_ACC),
            min_contribution(),
            PRESALE_START + DAY,
        );
        claim!(result.is_ok());
        claim_eq!(sum_of_balances(host.state()), TOTAL_SUPPLY);

        let (result, _) = call_deposit(&mut host, BUYER2_ACC, min_contribution(), SALE_START + DAY);
        claim!(result.is_ok());
        claim_eq!(sum_of_balances(host.state()), TOTAL_SUPPLY);

        let params_bytes = to_bytes(&TransferParams {
            to: Address::Account(RECEIVER_ACC),
            amount: 1_000u64.into(),
        });
        let mut ctx = receive_ctx(BUYER_ACC, SALE_END + 14 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer(&ctx, &mut host, &mut logger);
        claim!(result.is_ok());
        claim_eq!(sum_of_balances(host.state()), TOTAL_SUPPLY);
    }
}
