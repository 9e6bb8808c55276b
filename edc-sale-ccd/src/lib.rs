//! EduCoin (EDC) sale ledger. One contract holds the coin balances, the
//! time-gated crowdsale with descending weekly rates, the hard-cap refund
//! logic, the locked family reserve and the soft-cap refund path.
#[cfg(any(feature = "wasm-test", test))]
mod sctest;
mod state;
mod view;

use concordium_std::*;
use sale_utils::{
    ApprovalEvent, FamilyUnlockEvent, FundsReturnEvent, OwnershipEvent, PurchaseEvent, RefundEvent,
    SaleEvent, TransferEvent,
};
use state::{State, *};

/// The parameter schema for `init` function. Everything else (supply split,
/// caps, rates, minimum contribution, lock durations) is fixed policy.
#[derive(Debug, Serialize, SchemaType)]
pub struct InitParams {
    /// Pre-sale window is [presale_start, presale_end)
    pub presale_start: Timestamp,
    pub presale_end: Timestamp,
    /// Public sale window is [sale_start, sale_end)
    pub sale_start: Timestamp,
    pub sale_end: Timestamp,
    /// Account the accepted contribution value is forwarded to
    pub treasury: AccountAddress,
}

/// # Init Function
/// The account creating the instance becomes the administrator. The whole
/// supply is distributed immediately: the family reserve to the lock
/// account, the rest to the administrator as sale stock.
///
/// Reject if:
/// - Fails to parse parameter
/// - The four timestamps are not ordered, or the pre-sale already started
#[init(contract = "edc_sale_ccd", parameter = "InitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params: InitParams = ctx.parameter_cursor().get()?;

    let schedule = SaleSchedule::new(
        ctx.metadata().slot_time(),
        params.presale_start,
        params.presale_end,
        params.sale_start,
        params.sale_end,
    )?;

    Ok(State::new(
        state_builder,
        ctx.init_origin(),
        params.treasury,
        schedule,
    ))
}

// ==============================================
// For contributors
// ==========================================

/// Purchase with an explicit beneficiary. The sender pays, the beneficiary
/// receives the coins; the contribution (and any later refund right) stays
/// with the sender.
///
/// Caller: any account
/// Reject if:
/// - Fails to parse parameter
/// - The sender is a contract
/// - No purchase phase is open (`PhaseClosed`)
/// - The payment is below the minimum contribution (`BelowMinimum`)
/// - The active phase already sold out (`CapReached`)
#[receive(
    contract = "edc_sale_ccd",
    name = "buy",
    parameter = "Address",
    error = "ContractError",
    enable_logger,
    mutable,
    payable
)]
fn contract_buy<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let buyer = match ctx.sender() {
        Address::Account(addr) => addr,
        _ => bail!(CustomContractError::AccountOnly.into()),
    };
    let beneficiary: Address = ctx.parameter_cursor().get()?;

    execute_buy(
        host,
        ctx.metadata().slot_time(),
        buyer,
        beneficiary,
        amount,
        logger,
    )
}

/// Bare value receipt. Value from anyone but the treasury buys coins for
/// the sender, through the same validation as `buy`. Value from the
/// treasury is the funds-return path backing refunds after a soft-cap miss.
///
/// Caller: any account
/// Reject if:
/// - The sender is a contract
/// - Treasury: the sale is still open, or the soft cap was reached
///   (`FundingNotAllowed`)
/// - Anyone else: same conditions as `buy`
#[receive(
    contract = "edc_sale_ccd",
    name = "deposit",
    error = "ContractError",
    enable_logger,
    mutable,
    payable
)]
fn contract_deposit<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let sender = match ctx.sender() {
        Address::Account(addr) => addr,
        _ => bail!(CustomContractError::AccountOnly.into()),
    };
    let now = ctx.metadata().slot_time();

    if sender == host.state().treasury {
        let state = host.state();
        ensure!(
            state.schedule.is_ended(now),
            CustomContractError::FundingNotAllowed.into()
        );
        ensure!(
            state.total_sold.0 < SALE_SOFTCAP,
            CustomContractError::FundingNotAllowed.into()
        );
        // the value simply stays on the contract for claimRefund payouts
        logger.log(&SaleEvent::FundsReturn(FundsReturnEvent { value: amount }))?;
        return Ok(());
    }

    execute_buy(host, now, sender, Address::Account(sender), amount, logger)
}

/// The one purchase routine behind `buy` and `deposit`. All checks happen
/// before the first mutation, so a rejection has no effect.
fn execute_buy<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    now: Timestamp,
    buyer: AccountAddress,
    beneficiary: Address,
    value: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let state = host.state();

    let phase = state.schedule.phase(now);
    let rate = match phase.rate() {
        Some(rate) => rate,
        None => bail!(CustomContractError::PhaseClosed.into()),
    };
    ensure!(
        value.micro_ccd >= MIN_CONTRIBUTION_MICRO_CCD,
        CustomContractError::BelowMinimum.into()
    );

    // one running counter, checked against whichever cap the phase enforces
    let cap = phase.cap().unwrap_abort();
    ensure!(state.total_sold < cap, CustomContractError::CapReached.into());
    let headroom = CoinAmount::from(cap.0 - state.total_sold.0);

    let requested = coins_from_value(value, rate)?;
    let (issued, accepted) = if requested > headroom {
        // sell the last coins under the cap and pay back the rest
        (headroom, value_for_coins(headroom, rate)?)
    } else {
        (requested, value)
    };
    let refund = value - accepted;
    let treasury = state.treasury;

    let state = host.state_mut();
    state.issue(&beneficiary, issued)?;
    state.record_contribution(&buyer, accepted, issued);

    // both legs settle inside the same atomic invocation as the issuance
    let transfer_result = host.invoke_transfer(&treasury, accepted);
    ensure!(
        transfer_result.is_ok(),
        CustomContractError::TransferError.into()
    );
    if refund.micro_ccd > 0 {
        let transfer_result = host.invoke_transfer(&buyer, refund);
        ensure!(
            transfer_result.is_ok(),
            CustomContractError::TransferError.into()
        );
    }

    logger.log(&SaleEvent::Purchase(PurchaseEvent {
        buyer,
        beneficiary,
        value: accepted,
        coins: issued,
    }))?;

    Ok(())
}

// ==============================================
// Coin ledger
// ==========================================

/// The parameter type for the contract function `transfer`.
#[derive(Debug, Serialize, SchemaType)]
pub struct TransferParams {
    pub to: Address,
    pub amount: CoinAmount,
}

/// Moves coins of the sender. Closed for every caller, the administrator
/// included, until 14 days past the sale end.
///
/// Caller: any address holding coins
/// Reject if:
/// - Fails to parse parameter
/// - The transfer lock has not expired (`TransfersLocked`)
/// - The sender balance does not cover the amount
#[receive(
    contract = "edc_sale_ccd",
    name = "transfer",
    parameter = "TransferParams",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_transfer<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params: TransferParams = ctx.parameter_cursor().get()?;
    ensure!(
        host.state()
            .schedule
            .transfers_unlocked(ctx.metadata().slot_time()),
        CustomContractError::TransfersLocked.into()
    );

    let sender = ctx.sender();
    host.state_mut()
        .transfer_coins(&sender, &params.to, params.amount)?;

    logger.log(&SaleEvent::Transfer(TransferEvent {
        from: sender,
        to: params.to,
        amount: params.amount,
    }))?;

    Ok(())
}

/// The parameter type for the contract function `approve`.
#[derive(Debug, Serialize, SchemaType)]
pub struct ApproveParams {
    pub spender: Address,
    pub amount: CoinAmount,
}

/// Sets the spender allowance of the sender. Allowed in any phase;
/// overwrites the previous allowance rather than adding to it.
#[receive(
    contract = "edc_sale_ccd",
    name = "approve",
    parameter = "ApproveParams",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_approve<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params: ApproveParams = ctx.parameter_cursor().get()?;
    let sender = ctx.sender();

    host.state_mut()
        .set_allowance(&sender, &params.spender, params.amount);

    logger.log(&SaleEvent::Approval(ApprovalEvent {
        owner: sender,
        spender: params.spender,
        amount: params.amount,
    }))?;

    Ok(())
}

/// The parameter type for the contract function `transferFrom`.
#[derive(Debug, Serialize, SchemaType)]
pub struct TransferFromParams {
    pub from: Address,
    pub to: Address,
    pub amount: CoinAmount,
}

/// Spends an allowance. The administrator may settle approved transfers
/// while the lock is still down; the allowance and balance checks are
/// never skipped, for the administrator or anyone else.
///
/// Caller: any address
/// Reject if:
/// - Fails to parse parameter
/// - The sender is not the administrator and the transfer lock has not
///   expired (`TransfersLocked`)
/// - The allowance does not cover the amount
/// - The owner balance does not cover the amount
#[receive(
    contract = "edc_sale_ccd",
    name = "transferFrom",
    parameter = "TransferFromParams",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_transfer_from<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params: TransferFromParams = ctx.parameter_cursor().get()?;
    let sender = ctx.sender();

    let state = host.state();
    if !sender.matches_account(&state.admin) {
        ensure!(
            state.schedule.transfers_unlocked(ctx.metadata().slot_time()),
            CustomContractError::TransfersLocked.into()
        );
    }
    ensure!(
        state.allowance(&params.from, &sender) >= params.amount,
        CustomContractError::InsufficientAllowance.into()
    );
    ensure!(
        state.balance_of(&params.from) >= params.amount,
        ContractError::InsufficientFunds
    );

    let state = host.state_mut();
    state.consume_allowance(&params.from, &sender, params.amount)?;
    state.transfer_coins(&params.from, &params.to, params.amount)?;

    logger.log(&SaleEvent::Transfer(TransferEvent {
        from: params.from,
        to: params.to,
        amount: params.amount,
    }))?;

    Ok(())
}

// ==============================================
// For the administrator
// ==========================================

/// Moves the whole family reserve from the lock account to the
/// administrator once the lock has expired. Calling again after a
/// successful release does nothing.
///
/// Caller: administrator only
/// Reject if:
/// - The sender is not the administrator
/// - The reserve is still locked (`LockNotExpired`)
#[receive(
    contract = "edc_sale_ccd",
    name = "unlockFamilyCoins",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_unlock_family_coins<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&host.state().admin),
        ContractError::Unauthorized
    );

    if host.state().family_released {
        // released once already; repeat calls change nothing
        return Ok(());
    }

    ensure!(
        host.state()
            .schedule
            .family_unlocked(ctx.metadata().slot_time()),
        CustomContractError::LockNotExpired.into()
    );

    let amount = host.state_mut().release_family()?;

    logger.log(&SaleEvent::FamilyUnlock(FamilyUnlockEvent {
        to: host.state().admin,
        amount,
    }))?;

    Ok(())
}

/// Hands the administrator role to another account, 30 days after the
/// sale end at the earliest. The genesis stock does not move with the
/// role.
///
/// Caller: administrator only
/// Reject if:
/// - Fails to parse parameter
/// - The sender is not the administrator
/// - Called before 30 days past the sale end (`TooEarly`)
#[receive(
    contract = "edc_sale_ccd",
    name = "transferOwnership",
    parameter = "AccountAddress",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_transfer_ownership<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let new_admin: AccountAddress = ctx.parameter_cursor().get()?;

    ensure!(
        ctx.sender().matches_account(&host.state().admin),
        ContractError::Unauthorized
    );
    ensure!(
        host.state()
            .schedule
            .ownership_unlocked(ctx.metadata().slot_time()),
        CustomContractError::TooEarly.into()
    );

    let previous = host.state().admin;
    host.state_mut().admin = new_admin;

    logger.log(&SaleEvent::Ownership(OwnershipEvent {
        previous,
        new_admin,
    }))?;

    Ok(())
}

/// Pays a contributor back their whole accepted contribution after the
/// sale ended below the soft cap. The coins they bought stay with them.
/// Claiming twice finds nothing owed the second time and succeeds without
/// effect.
///
/// Caller: any account
/// Reject if:
/// - The sender is a contract
/// - The sale has not ended, or reached the soft cap (`RefundNotEligible`)
/// - The contract does not hold enough value for the payout
#[receive(
    contract = "edc_sale_ccd",
    name = "claimRefund",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_claim_refund<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let claimer = match ctx.sender() {
        Address::Account(addr) => addr,
        _ => bail!(CustomContractError::AccountOnly.into()),
    };
    let now = ctx.metadata().slot_time();

    let state = host.state();
    ensure!(
        state.schedule.is_ended(now),
        CustomContractError::RefundNotEligible.into()
    );
    ensure!(
        state.total_sold.0 < SALE_SOFTCAP,
        CustomContractError::RefundNotEligible.into()
    );

    let paid = host.state_mut().take_contribution(&claimer);
    if paid == Amount::zero() {
        return Ok(());
    }
    host.state_mut().total_raised -= paid;

    let transfer_result = host.invoke_transfer(&claimer, paid);
    ensure!(
        transfer_result.is_ok(),
        CustomContractError::TransferError.into()
    );

    logger.log(&SaleEvent::Refund(RefundEvent {
        contributor: claimer,
        value: paid,
    }))?;

    Ok(())
}
