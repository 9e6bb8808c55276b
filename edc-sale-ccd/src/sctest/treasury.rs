use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
mod tests {
    use crate::sctest::*;
    use crate::*;
    use concordium_std::test_infrastructure::*;

    #[concordium_test]
    /// The treasury cannot push value back while the sale is running.
    fn test_funds_return_rejected_during_sale() {
        let mut host = new_host();

        let (result, _) = call_deposit(
            &mut host,
            TREASURY_ACC,
            Amount::from_micro_ccd(5_000_000),
            SALE_START + DAY,
        );
        claim_eq!(
            result.expect_err_report("funding during the sale must reject"),
            CustomContractError::FundingNotAllowed.into()
        );
    }

    #[concordium_test]
    /// With the soft cap met there is nothing to refund, so the ledger
    /// refuses the money.
    fn test_funds_return_rejected_when_softcap_met() {
        let mut host = new_host();
        host.state_mut().total_sold = sale_utils::SALE_SOFTCAP.into();

        let (result, _) = call_deposit(
            &mut host,
            TREASURY_ACC,
            Amount::from_micro_ccd(5_000_000),
            SALE_END + DAY,
        );
        claim_eq!(
            result.expect_err_report("funding above the soft cap must reject"),
            CustomContractError::FundingNotAllowed.into()
        );
    }

    #[concordium_test]
    /// After a soft-cap miss the returned value is accepted and simply
    /// stays on the contract.
    fn test_funds_return_accepted_after_softcap_miss() {
        let mut state_builder = TestStateBuilder::new();
        let initial = initial_state(&mut state_builder);
        let expected = initial_state(&mut state_builder);
        let mut host = TestHost::new(initial, state_builder);
        let returned = Amount::from_micro_ccd(40_000_000);

        let (result, logger) = call_deposit(&mut host, TREASURY_ACC, returned, SALE_END + DAY);
        claim!(result.is_ok(), "funding a missed sale should succeed");

        // the value stays on the contract; the ledger itself is untouched
        claim_eq!(*host.state(), expected);
        claim_eq!(host.get_transfers().len(), 0, "the value is kept, not forwarded");
        claim_eq!(logger.logs.len(), 1, "one funds-return event expected");
    }

    #[concordium_test]
    /// Returned funds back the refund payouts end to end.
    fn test_returned_funds_back_refunds() {
        let mut host = new_host();
        let value = min_contribution();

        let (result, _) = call_buy(
            &mut host,
            BUYER_ACC,
            Address::Account(BUYER_ACC),
            value,
            PRESALE_START + DAY,
        );
        claim!(result.is_ok());
        claim!(host.state().total_sold.0 < sale_utils::SALE_SOFTCAP);

        let (result, _) = call_deposit(&mut host, TREASURY_ACC, value, SALE_END + DAY);
        claim!(result.is_ok(), "the treasury returns the raised value");

        let ctx = receive_ctx(BUYER_ACC, SALE_END + 2 * DAY);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_claim_refund(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "the refund should be payable now");

        claim_eq!(
            host.get_transfers(),
            [(TREASURY_ACC, value), (BUYER_ACC, value)],
            "the buyer gets back exactly what they paid"
        );
        claim_eq!(host.state().contribution_of(&BUYER_ACC), Amount::zero());
        claim_eq!(host.state().total_raised, Amount::zero());
    }
}
