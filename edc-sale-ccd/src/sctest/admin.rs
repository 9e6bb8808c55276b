use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
mod tests {
    use crate::sctest::*;
    use crate::*;
    use concordium_std::test_infrastructure::*;

    #[concordium_test]
    fn test_unlock_family_requires_admin() {
        let mut host = new_host();

        let ctx = receive_ctx(BUYER_ACC, SALE_END + 180 * DAY + DAY);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_unlock_family_coins(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("only the administrator may unlock"),
            ContractError::Unauthorized
        );
        claim!(!host.state().family_released);
        claim_eq!(
            host.state().balance_of(&Address::Account(LOCK_ACCOUNT)).0,
            FAMILY_SUPPLY
        );
    }

    #[concordium_test]
    fn test_unlock_family_before_lock_expiry() {
        let mut host = new_host();

        let ctx = receive_ctx(ADMIN_ACC, SALE_END + 180 * DAY - 1);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_unlock_family_coins(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("the reserve is still locked"),
            CustomContractError::LockNotExpired.into()
        );
        claim!(!host.state().family_released);
        claim_eq!(
            host.state().balance_of(&Address::Account(LOCK_ACCOUNT)).0,
            FAMILY_SUPPLY
        );
    }

    #[concordium_test]
    /// The release moves the whole reserve once; a repeat call is a no-op.
    fn test_unlock_family_release_is_idempotent() {
        let mut host = new_host();

        let ctx = receive_ctx(ADMIN_ACC, SALE_END + 180 * DAY);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_unlock_family_coins(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "the first release should succeed");

        let state = host.state();
        claim!(state.family_released);
        claim_eq!(state.balance_of(&Address::Account(LOCK_ACCOUNT)).0, 0);
        claim_eq!(
            state.balance_of(&Address::Account(ADMIN_ACC)).0,
            TOTAL_SUPPLY,
            "the administrator ends up with stock plus reserve"
        );
        claim_eq!(sum_of_balances(state), TOTAL_SUPPLY);
        claim_eq!(logger.logs.len(), 1);

        // calling again changes nothing
        let ctx = receive_ctx(ADMIN_ACC, SALE_END + 181 * DAY);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_unlock_family_coins(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "a repeat release is a silent success");

        let state = host.state();
        claim!(state.family_released);
        claim_eq!(state.balance_of(&Address::Account(LOCK_ACCOUNT)).0, 0);
        claim_eq!(state.balance_of(&Address::Account(ADMIN_ACC)).0, TOTAL_SUPPLY);
        claim_eq!(logger.logs.len(), 0, "no second unlock event");
    }

    #[concordium_test]
    fn test_transfer_ownership_requires_admin() {
        let mut host = new_host();

        let params_bytes = to_bytes(&BUYER_ACC);
        let mut ctx = receive_ctx(BUYER_ACC, SALE_END + 30 * DAY + DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_transfer_ownership(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("only the administrator may hand over"),
            ContractError::Unauthorized
        );
        claim_eq!(host.state().admin, ADMIN_ACC);
    }

    #[concordium_test]
    fn test_transfer_ownership_gate_boundary() {
        let mut host = new_host();
        let params_bytes = to_bytes(&RECEIVER_ACC);

        let mut ctx = receive_ctx(ADMIN_ACC, SALE_END + 30 * DAY - 1);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_transfer_ownership(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("handover before 30 days must reject"),
            CustomContractError::TooEarly.into()
        );
        claim_eq!(host.state().admin, ADMIN_ACC);

        let mut ctx = receive_ctx(ADMIN_ACC, SALE_END + 30 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_transfer_ownership(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "handover at the boundary should succeed");
        claim_eq!(host.state().admin, RECEIVER_ACC);
        claim_eq!(logger.logs.len(), 1);

        // the old administrator lost the capability
        let params_bytes = to_bytes(&ADMIN_ACC);
        let mut ctx = receive_ctx(ADMIN_ACC, SALE_END + 31 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_transfer_ownership(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("the old administrator is out"),
            ContractError::Unauthorized
        );

        // and the new one can hand it back
        let mut ctx = receive_ctx(RECEIVER_ACC, SALE_END + 31 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> =
            contract_transfer_ownership(&ctx, &mut host, &mut logger);
        claim!(result.is_ok());
        claim_eq!(host.state().admin, ADMIN_ACC);
    }

    #[concordium_test]
    /// The administrator settles approved transfers while the gate is
    /// still down, but never without a covering allowance.
    fn test_admin_transfer_from_exempt_from_gate() {
        let mut host = new_host();
        host.state_mut()
            .transfer_coins(
                &Address::Account(ADMIN_ACC),
                &Address::Account(BUYER_ACC),
                500u64.into(),
            )
            .unwrap_abort();

        // the buyer grants the administrator an allowance; approve is open
        // in any phase
        let params_bytes = to_bytes(&ApproveParams {
            spender: Address::Account(ADMIN_ACC),
            amount: 200u64.into(),
        });
        let mut ctx = receive_ctx(BUYER_ACC, SALE_END + DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_approve(&ctx, &mut host, &mut logger);
        claim!(result.is_ok());

        // one day past the sale end, far inside the 14 day lock
        let transfer_bytes = to_bytes(&TransferFromParams {
            from: Address::Account(BUYER_ACC),
            to: Address::Account(RECEIVER_ACC),
            amount: 150u64.into(),
        });
        let mut ctx = receive_ctx(ADMIN_ACC, SALE_END + DAY);
        ctx.set_parameter(&transfer_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer_from(&ctx, &mut host, &mut logger);
        claim!(result.is_ok(), "the administrator bypasses the time gate");

        let state = host.state();
        claim_eq!(state.balance_of(&Address::Account(BUYER_ACC)).0, 350);
        claim_eq!(state.balance_of(&Address::Account(RECEIVER_ACC)).0, 150);
        claim_eq!(
            state
                .allowance(&Address::Account(BUYER_ACC), &Address::Account(ADMIN_ACC))
                .0,
            50,
            "the exemption does not skip the allowance bookkeeping"
        );

        // no allowance, no transfer, administrator or not
        let no_allowance_bytes = to_bytes(&TransferFromParams {
            from: Address::Account(RECEIVER_ACC),
            to: Address::Account(ADMIN_ACC),
            amount: 10u64.into(),
        });
        let mut ctx = receive_ctx(ADMIN_ACC, SALE_END + DAY);
        ctx.set_parameter(&no_allowance_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer_from(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("the administrator still needs an allowance"),
            CustomContractError::InsufficientAllowance.into()
        );
    }

    #[concordium_test]
    /// The plain `transfer` lock binds the administrator too.
    fn test_admin_plain_transfer_locked() {
        let mut host = new_host();

        let params_bytes = to_bytes(&TransferParams {
            to: Address::Account(RECEIVER_ACC),
            amount: 100u64.into(),
        });
        let mut ctx = receive_ctx(ADMIN_ACC, SALE_END + 13 * DAY);
        ctx.set_parameter(&params_bytes);
        let mut logger = TestLogger::init();
        let result: ContractResult<()> = contract_transfer(&ctx, &mut host, &mut logger);
        claim_eq!(
            result.expect_err_report("the lock applies to the administrator"),
            CustomContractError::TransfersLocked.into()
        );
        claim_eq!(host.state().balance_of(&Address::Account(RECEIVER_ACC)).0, 0);
    }
}
