//! Program errors. Explicit codes improve auditability and client handling.

use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Engine is paused")]
    EnginePaused,

    #[msg("Trigger threshold must be greater than zero")]
    InvalidThreshold,

    #[msg("Order amount must be greater than zero")]
    ZeroAmount,

    #[msg("Order amount exceeds max_order_amount")]
    OrderAmountExceedsLimit,

    #[msg("Escrow entry already exists for this order")]
    DuplicateEscrow,

    #[msg("No escrow entry for this order")]
    EscrowNotFound,

    #[msg("Unauthorized: executor capability required")]
    NotAuthorized,

    #[msg("Caller is not the order owner")]
    NotOrderOwner,

    #[msg("Order is not pending")]
    OrderNotPending,

    #[msg("Price does not satisfy the order trigger")]
    TriggerNotMet,

    #[msg("Normalized price is outside the configured sanity band")]
    PriceOutOfRange,

    #[msg("Price normalization overflowed the fixed-point width")]
    PriceOverflow,

    #[msg("Price band must satisfy 0 < min_price < max_price")]
    InvalidPriceBand,

    #[msg("Vault token account does not match the configured mint and authority")]
    InvalidVault,

    #[msg("Arithmetic overflow in counter or settlement math")]
    MathOverflow,
}
