//! Program state accounts for the trigger vault.
//!
//! Locked value lives in a single vault token account owned by the registry
//! PDA; per-order bookkeeping lives in `EscrowEntry` records. An entry exists
//! exactly as long as its order is pending, so the two exit paths (owner
//! cancel, executor trigger) race over the same record and the loser fails
//! cleanly on the status guard.

use anchor_lang::prelude::*;

use crate::errors::VaultError;

/// Which side of the threshold arms the trigger.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerDirection {
    /// Trigger when price <= threshold (stop-loss style).
    FallsTo,
    /// Trigger when price >= threshold (take-profit style).
    RisesTo,
}

/// Order lifecycle. Pending is the only status with outgoing transitions;
/// Executed and Cancelled are terminal.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Executed,
    Cancelled,
}

/// Global config. Single instance per program.
/// Holds the bootstrap authority and the executor capability.
#[account]
#[derive(Default)]
pub struct Config {
    /// Bootstrap principal: may update the price band and pause the engine.
    pub authority: Pubkey,
    /// The live executor capability holder. Minted once at initialize;
    /// transferable by its current holder, never duplicable.
    pub executor: Pubkey,
    /// Circuit breaker: blocks create_order and execute_order.
    /// Owner cancellation stays available while paused.
    pub paused: bool,
    /// Bump used to derive the config PDA.
    pub bump: u8,
}

impl Config {
    pub const LEN: usize = 32 + 32 + 1 + 1;
}

/// Aggregate state of the order registry and escrow ledger.
/// The registry PDA is also the vault authority.
#[account]
#[derive(Default)]
pub struct Registry {
    /// Mint of the escrowed asset (native SOL is escrowed as wrapped SOL).
    pub asset_mint: Pubkey,
    /// Vault token account holding all locked value. Owned by this PDA.
    pub vault: Pubkey,
    /// Monotonic count of orders ever created. The next order takes the
    /// current value as its identity.
    pub total_orders_created: u64,
    /// Number of orders currently pending. Invariant: equals the number of
    /// live escrow entries.
    pub active_orders: u64,
    /// Sum of all live escrow balances. Auditable against the vault balance.
    pub total_locked: u64,
    /// Lower bound of the execution-price sanity band (1e9 scale, > 0).
    pub min_price: u64,
    /// Upper bound of the execution-price sanity band (1e9 scale).
    pub max_price: u64,
    /// Max amount a single order may lock (0 = disabled).
    pub max_order_amount: u64,
    /// PDA bump for the registry.
    pub bump: u8,
}

impl Registry {
    pub const LEN: usize = 32 + 32 + 8 + 8 + 8 + 8 + 8 + 8 + 1;

    /// Account a new pending order and its deposit. The caller reads the
    /// order identity from `total_orders_created` before calling this.
    pub fn record_order_created(&mut self, amount: u64) -> Result<()> {
        self.total_orders_created = self
            .total_orders_created
            .checked_add(1)
            .ok_or(VaultError::MathOverflow)?;
        self.active_orders = self
            .active_orders
            .checked_add(1)
            .ok_or(VaultError::MathOverflow)?;
        self.total_locked = self
            .total_locked
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Account an order leaving pending (cancelled or executed) and its
    /// escrow balance leaving the vault.
    pub fn record_order_closed(&mut self, amount: u64) -> Result<()> {
        self.active_orders = self
            .active_orders
            .checked_sub(1)
            .ok_or(VaultError::MathOverflow)?;
        self.total_locked = self
            .total_locked
            .checked_sub(amount)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }
}

/// One conditional release instruction. Persists forever as history;
/// only `status` ever changes after creation, and only away from Pending.
#[account]
#[derive(Debug)]
pub struct Order {
    /// Identity allocated from the registry counter. PDA seed.
    pub id: u64,
    /// Principal that created the order and receives any disbursement.
    pub owner: Pubkey,
    /// Quantity locked for this order. No partial fills.
    pub amount: u64,
    /// Fixed-point trigger threshold, 1e9 scale. Always > 0.
    pub trigger_price: u64,
    pub direction: TriggerDirection,
    pub status: OrderStatus,
    /// Timestamp captured at creation.
    pub created_at: i64,
    /// PDA bump for this order.
    pub bump: u8,
}

impl Order {
    pub const LEN: usize = 8 + 32 + 8 + 8 + 1 + 1 + 8 + 1;

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Pending -> Cancelled. The status guard makes cancel and execute
    /// mutually exclusive: whichever applies first wins, the other fails.
    pub fn mark_cancelled(&mut self) -> Result<()> {
        require!(self.is_pending(), VaultError::OrderNotPending);
        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Pending -> Executed. Same guard as `mark_cancelled`.
    pub fn mark_executed(&mut self) -> Result<()> {
        require!(self.is_pending(), VaultError::OrderNotPending);
        self.status = OrderStatus::Executed;
        Ok(())
    }
}

/// Locked-value record backing one pending order. Created together with the
/// order, closed to the owner when the order leaves pending.
#[account]
pub struct EscrowEntry {
    /// Order this entry backs. Lookup key and PDA seed.
    pub order_id: u64,
    /// Copy of the order owner; authorization source for owner withdrawal
    /// and the only beneficiary of an authorized withdrawal.
    pub owner: Pubkey,
    /// Locked quantity. Equals the order amount for the entry's lifetime.
    pub balance: u64,
    /// PDA bump for this entry.
    pub bump: u8,
}

impl EscrowEntry {
    pub const LEN: usize = 8 + 32 + 8 + 1;
}

/// Immutable audit record of one successful execution. Written once,
/// never read back by the program.
#[account]
pub struct ExecutionReceipt {
    pub order_id: u64,
    /// Beneficiary of the disbursement (always the order owner).
    pub owner: Pubkey,
    pub amount_released: u64,
    /// amount_released * execution_price / 1e9.
    pub settlement_value_estimate: u64,
    /// Normalized price that satisfied the trigger.
    pub execution_price: u64,
    pub executed_at: i64,
    pub bump: u8,
}

impl ExecutionReceipt {
    pub const LEN: usize = 8 + 32 + 8 + 8 + 8 + 8 + 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_order() -> Order {
        Order {
            id: 0,
            owner: Pubkey::default(),
            amount: 1_000_000_000,
            trigger_price: 2_500_000_000,
            direction: TriggerDirection::FallsTo,
            status: OrderStatus::Pending,
            created_at: 1_700_000_000,
            bump: 255,
        }
    }

    #[test]
    fn test_cancel_then_execute_rejected() {
        let mut order = pending_order();
        assert!(order.mark_cancelled().is_ok());
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.mark_executed().is_err());
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_execute_then_cancel_rejected() {
        let mut order = pending_order();
        assert!(order.mark_executed().is_ok());
        assert_eq!(order.status, OrderStatus::Executed);
        assert!(order.mark_cancelled().is_err());
        assert_eq!(order.status, OrderStatus::Executed);
    }

    #[test]
    fn test_double_cancel_rejected() {
        let mut order = pending_order();
        assert!(order.mark_cancelled().is_ok());
        assert!(order.mark_cancelled().is_err());
    }

    #[test]
    fn test_registry_counters_across_lifecycle() {
        let mut registry = Registry::default();

        registry.record_order_created(1_000_000_000).unwrap();
        registry.record_order_created(250_000_000).unwrap();
        registry.record_order_created(750_000_000).unwrap();
        assert_eq!(registry.total_orders_created, 3);
        assert_eq!(registry.active_orders, 3);
        assert_eq!(registry.total_locked, 2_000_000_000);

        // One cancel, one execute: active count and locked total fall,
        // the creation counter never does.
        registry.record_order_closed(1_000_000_000).unwrap();
        registry.record_order_closed(250_000_000).unwrap();
        assert_eq!(registry.total_orders_created, 3);
        assert_eq!(registry.active_orders, 1);
        assert_eq!(registry.total_locked, 750_000_000);

        registry.record_order_closed(750_000_000).unwrap();
        assert_eq!(registry.active_orders, 0);
        assert_eq!(registry.total_locked, 0);
    }

    #[test]
    fn test_registry_close_underflow_rejected() {
        let mut registry = Registry::default();
        registry.record_order_created(100).unwrap();
        // Closing more than was ever locked must fail, not wrap.
        assert!(registry.record_order_closed(101).is_err());
    }

    #[test]
    fn test_account_sizes() {
        assert_eq!(Config::LEN, 66);
        assert_eq!(Registry::LEN, 113);
        assert_eq!(Order::LEN, 67);
        assert_eq!(EscrowEntry::LEN, 49);
        assert_eq!(ExecutionReceipt::LEN, 73);
    }
}
