//! Events emitted by the trigger vault program.
//! Indexers and the execution scheduler consume these to reconstruct order
//! state without scanning the registry.

use anchor_lang::prelude::*;

use crate::state::TriggerDirection;

/// Why escrow left the vault. Tagged on every withdrawal for audit.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WithdrawReason {
    OwnerCancel,
    ExecutorTrigger,
}

#[event]
pub struct OrderCreated {
    pub order: Pubkey,
    pub order_id: u64,
    pub owner: Pubkey,
    pub amount: u64,
    pub trigger_price: u64,
    pub direction: TriggerDirection,
    pub timestamp: i64,
}

#[event]
pub struct OrderCancelled {
    pub order_id: u64,
    pub owner: Pubkey,
    pub amount_returned: u64,
    pub timestamp: i64,
}

#[event]
pub struct OrderExecuted {
    pub order_id: u64,
    pub owner: Pubkey,
    pub execution_price: u64,
    pub amount_released: u64,
    pub settlement_value_estimate: u64,
    pub timestamp: i64,
}

#[event]
pub struct EscrowDeposited {
    pub order_id: u64,
    pub owner: Pubkey,
    pub amount: u64,
    /// Running total across all live escrow entries, after this deposit.
    pub total_locked: u64,
    pub timestamp: i64,
}

#[event]
pub struct EscrowWithdrawn {
    pub order_id: u64,
    pub owner: Pubkey,
    pub amount: u64,
    pub reason: WithdrawReason,
    /// Running total across all live escrow entries, after this withdrawal.
    pub total_locked: u64,
    pub timestamp: i64,
}

#[event]
pub struct ExecutorTransferred {
    pub previous_executor: Pubkey,
    pub new_executor: Pubkey,
    pub timestamp: i64,
}
