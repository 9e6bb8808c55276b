use concordium_std::{
    collections::BTreeMap, fmt::Debug, schema, AccountAddress, Address, Amount, SchemaType, Serial,
    Write,
};

pub mod error;
pub mod types;

use types::{CoinAmount, CoinRate, MicroCcd};

/// Sub-units per EDC coin. Every `CoinAmount` in the ledger is µEDC.
pub const MICRO_EDC: u64 = 1_000_000;

/// Fixed coin supply, distributed in full at init.
pub const TOTAL_SUPPLY: u64 = 500_000_000 * MICRO_EDC;

/// Founders reserve, held by the lock account until released.
pub const FAMILY_SUPPLY: u64 = 150_000_000 * MICRO_EDC;

/// Ceiling for `total_sold` while the pre-sale is open.
pub const PRESALE_HARDCAP: u64 = 100_000_000 * MICRO_EDC;

/// Ceiling for `total_sold` during the public sale weeks.
pub const SALE_HARDCAP: u64 = 300_000_000 * MICRO_EDC;

/// If the sale closes below this, contributions become refundable.
pub const SALE_SOFTCAP: u64 = 35_000_000 * MICRO_EDC;

/// Smallest contribution accepted on any purchase path (10 CCD).
pub const MIN_CONTRIBUTION_MICRO_CCD: MicroCcd = 10_000_000;

/// µEDC issued per µCCD contributed, per phase.
pub const RATE_PRESALE: CoinRate = 1150;
pub const RATE_WEEK1: CoinRate = 1000;
pub const RATE_WEEK2: CoinRate = 920;
pub const RATE_WEEK3: CoinRate = 875;
pub const RATE_WEEK4: CoinRate = 830;

/// Coin transfers open this many days after the sale end.
pub const TRANSFER_LOCK_DAYS: u64 = 14;
/// The administrator role can be handed over this many days after the sale end.
pub const OWNERSHIP_LOCK_DAYS: u64 = 30;
/// The family reserve unlocks this many days after the sale end.
pub const FAMILY_LOCK_DAYS: u64 = 180;

/// Sentinel account holding the family reserve until release.
pub const LOCK_ACCOUNT: AccountAddress = AccountAddress([0u8; 32]);

// ---------------------------------------

/// Tags for the event log.
pub const PURCHASE_EVENT_TAG: u8 = 1u8;
pub const TRANSFER_EVENT_TAG: u8 = 2u8;
pub const APPROVAL_EVENT_TAG: u8 = 3u8;
pub const FAMILY_UNLOCK_EVENT_TAG: u8 = 4u8;
pub const OWNERSHIP_EVENT_TAG: u8 = 5u8;
pub const REFUND_EVENT_TAG: u8 = 6u8;
pub const FUNDS_RETURN_EVENT_TAG: u8 = 7u8;

/// A PurchaseEvent is logged for every accepted contribution.
/// `value` is the accepted part only; refunded excess is not included.
#[derive(Serial, SchemaType, Debug)]
pub struct PurchaseEvent {
    pub buyer: AccountAddress,
    pub beneficiary: Address,
    pub value: Amount,
    pub coins: CoinAmount,
}

#[derive(Serial, SchemaType, Debug)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: CoinAmount,
}

#[derive(Serial, SchemaType, Debug)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub amount: CoinAmount,
}

/// Logged once, when the family reserve moves to the administrator.
#[derive(Serial, SchemaType, Debug)]
pub struct FamilyUnlockEvent {
    pub to: AccountAddress,
    pub amount: CoinAmount,
}

#[derive(Serial, SchemaType, Debug)]
pub struct OwnershipEvent {
    pub previous: AccountAddress,
    pub new_admin: AccountAddress,
}

#[derive(Serial, SchemaType, Debug)]
pub struct RefundEvent {
    pub contributor: AccountAddress,
    pub value: Amount,
}

#[derive(Serial, SchemaType, Debug)]
pub struct FundsReturnEvent {
    pub value: Amount,
}

/// Tagged events to be serialized for the event log.
#[derive(Debug)]
pub enum SaleEvent {
    Purchase(PurchaseEvent),
    Transfer(TransferEvent),
    Approval(ApprovalEvent),
    FamilyUnlock(FamilyUnlockEvent),
    Ownership(OwnershipEvent),
    Refund(RefundEvent),
    FundsReturn(FundsReturnEvent),
}

impl Serial for SaleEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            SaleEvent::Purchase(event) => {
                out.write_u8(PURCHASE_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::Transfer(event) => {
                out.write_u8(TRANSFER_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::Approval(event) => {
                out.write_u8(APPROVAL_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::FamilyUnlock(event) => {
                out.write_u8(FAMILY_UNLOCK_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::Ownership(event) => {
                out.write_u8(OWNERSHIP_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::Refund(event) => {
                out.write_u8(REFUND_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::FundsReturn(event) => {
                out.write_u8(FUNDS_RETURN_EVENT_TAG)?;
                event.serial(out)
            }
        }
    }
}

impl schema::SchemaType for SaleEvent {
    fn get_type() -> schema::Type {
        let mut event_map = BTreeMap::new();
        event_map.insert(
            PURCHASE_EVENT_TAG,
            (
                "Purchase".to_string(),
                schema::Fields::Named(vec![
                    (String::from("buyer"), AccountAddress::get_type()),
                    (String::from("beneficiary"), Address::get_type()),
                    (String::from("value"), Amount::get_type()),
                    (String::from("coins"), CoinAmount::get_type()),
                ]),
            ),
        );
        event_map.insert(
            TRANSFER_EVENT_TAG,
            (
                "Transfer".to_string(),
                schema::Fields::Named(vec![
                    (String::from("from"), Address::get_type()),
                    (String::from("to"), Address::get_type()),
                    (String::from("amount"), CoinAmount::get_type()),
                ]),
            ),
        );
        event_map.insert(
            APPROVAL_EVENT_TAG,
            (
                "Approval".to_string(),
                schema::Fields::Named(vec![
                    (String::from("owner"), Address::get_type()),
                    (String::from("spender"), Address::get_type()),
                    (String::from("amount"), CoinAmount::get_type()),
                ]),
            ),
        );
        event_map.insert(
            FAMILY_UNLOCK_EVENT_TAG,
            (
                "FamilyUnlock".to_string(),
                schema::Fields::Named(vec![
                    (String::from("to"), AccountAddress::get_type()),
                    (String::from("amount"), CoinAmount::get_type()),
                ]),
            ),
        );
        event_map.insert(
            OWNERSHIP_EVENT_TAG,
            (
                "Ownership".to_string(),
                schema::Fields::Named(vec![
                    (String::from("previous"), AccountAddress::get_type()),
                    (String::from("new_admin"), AccountAddress::get_type()),
                ]),
            ),
        );
        event_map.insert(
            REFUND_EVENT_TAG,
            (
                "Refund".to_string(),
                schema::Fields::Named(vec![
                    (String::from("contributor"), AccountAddress::get_type()),
                    (String::from("value"), Amount::get_type()),
                ]),
            ),
        );
        event_map.insert(
            FUNDS_RETURN_EVENT_TAG,
            (
                "FundsReturn".to_string(),
                schema::Fields::Named(vec![(String::from("value"), Amount::get_type())]),
            ),
        );
        schema::Type::TaggedEnum(event_map)
    }
}
