//! # Trigger Vault Program
//!
//! Solana program for non-custodial conditional-order settlement: an owner
//! locks SPL tokens under a price-contingent release condition ("execute when
//! price crosses threshold X"); a separately authorized executor disburses
//! the escrow once a supplied price satisfies the condition, or the owner
//! cancels and withdraws unexecuted. Prices arrive as (mantissa, exponent)
//! pairs and are normalized to a 1e9 fixed-point scale before comparison.
//!
//! ## Security
//! - Anchor account validation and constraints
//! - Role-based access (bootstrap authority, executor capability)
//! - Escrow always disburses to the order owner, never the executor
//! - Cancel and execute share one status guard; the loser of a race fails cleanly
//! - Mandatory sanity band on execution prices (misbehaving feed input rejected)
//! - No re-entrancy (single CPI per instruction; no callback pattern)

pub mod errors;
pub mod events;
pub mod price;
pub mod state;

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};
use state::{Config, EscrowEntry, ExecutionReceipt, Order, OrderStatus, Registry, TriggerDirection};

use errors::*;
use events::*;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod trigger_vault {
    use super::*;

    /// Initialize global config and registry. Must be called once before any
    /// order. This is the single mint of the executor capability: the stored
    /// pubkey is the only principal accepted by execute_order, and only it
    /// can transfer the role. Authority can update the price band and pause.
    pub fn initialize(
        ctx: Context<Initialize>,
        min_price: u64,
        max_price: u64,
        max_order_amount: u64,
    ) -> Result<()> {
        require!(
            min_price > 0 && min_price < max_price,
            VaultError::InvalidPriceBand
        );

        let config = &mut ctx.accounts.config;
        config.authority = ctx.accounts.authority.key();
        config.executor = ctx.accounts.executor.key();
        config.paused = false;
        config.bump = ctx.bumps.config;

        let registry = &mut ctx.accounts.registry;
        registry.asset_mint = ctx.accounts.asset_mint.key();
        registry.vault = ctx.accounts.vault.key();
        registry.total_orders_created = 0;
        registry.active_orders = 0;
        registry.total_locked = 0;
        registry.min_price = min_price;
        registry.max_price = max_price;
        registry.max_order_amount = max_order_amount;
        registry.bump = ctx.bumps.registry;

        Ok(())
    }

    /// Create an order and deposit its escrow as one atomic operation. The
    /// registry allocates the identity; the full amount moves into the vault
    /// in the same instruction, so an order is never observable without its
    /// escrow or vice versa.
    pub fn create_order(
        ctx: Context<CreateOrder>,
        amount: u64,
        trigger_price: u64,
        direction: TriggerDirection,
    ) -> Result<()> {
        require!(!ctx.accounts.config.paused, VaultError::EnginePaused);
        require!(amount > 0, VaultError::ZeroAmount);
        require!(trigger_price > 0, VaultError::InvalidThreshold);

        let max_order_amount = ctx.accounts.registry.max_order_amount;
        if max_order_amount > 0 {
            require!(
                amount <= max_order_amount,
                VaultError::OrderAmountExceedsLimit
            );
        }

        let order_id = ctx.accounts.registry.total_orders_created;
        let owner_key = ctx.accounts.owner.key();
        let now = Clock::get()?.unix_timestamp;

        // Pull the deposit into the vault before any bookkeeping.
        let cpi_accounts = Transfer {
            from: ctx.accounts.owner_token.to_account_info(),
            to: ctx.accounts.vault.to_account_info(),
            authority: ctx.accounts.owner.to_account_info(),
        };
        token::transfer(
            CpiContext::new(ctx.accounts.token_program.to_account_info(), cpi_accounts),
            amount,
        )?;

        let order = &mut ctx.accounts.order;
        order.id = order_id;
        order.owner = owner_key;
        order.amount = amount;
        order.trigger_price = trigger_price;
        order.direction = direction;
        order.status = OrderStatus::Pending;
        order.created_at = now;
        order.bump = ctx.bumps.order;

        let escrow = &mut ctx.accounts.escrow;
        escrow.order_id = order_id;
        escrow.owner = owner_key;
        escrow.balance = amount;
        escrow.bump = ctx.bumps.escrow;

        ctx.accounts.registry.record_order_created(amount)?;

        emit!(OrderCreated {
            order: ctx.accounts.order.key(),
            order_id,
            owner: owner_key,
            amount,
            trigger_price,
            direction,
            timestamp: now,
        });
        emit!(EscrowDeposited {
            order_id,
            owner: owner_key,
            amount,
            total_locked: ctx.accounts.registry.total_locked,
            timestamp: now,
        });

        Ok(())
    }

    /// Owner-gated self-service exit: flip the order away from pending and
    /// return the full escrow balance. Deliberately callable while paused —
    /// the circuit breaker never traps owner funds.
    pub fn cancel_order(ctx: Context<CancelOrder>) -> Result<()> {
        // Flip first; this is the guard both exit paths share, so a
        // concurrent execute that lost the race fails here cleanly.
        ctx.accounts.order.mark_cancelled()?;

        let order_id = ctx.accounts.order.id;
        let owner_key = ctx.accounts.order.owner;
        let amount = ctx.accounts.escrow.balance;
        let registry_bump = ctx.accounts.registry.bump;
        let now = Clock::get()?.unix_timestamp;

        // Registry PDA signs for the vault.
        let seeds = &[b"registry".as_ref(), &[registry_bump]];
        let signer = &[&seeds[..]];
        let cpi_accounts = Transfer {
            from: ctx.accounts.vault.to_account_info(),
            to: ctx.accounts.owner_token.to_account_info(),
            authority: ctx.accounts.registry.to_account_info(),
        };
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                cpi_accounts,
                signer,
            ),
            amount,
        )?;

        ctx.accounts.registry.record_order_closed(amount)?;

        emit!(OrderCancelled {
            order_id,
            owner: owner_key,
            amount_returned: amount,
            timestamp: now,
        });
        emit!(EscrowWithdrawn {
            order_id,
            owner: owner_key,
            amount,
            reason: WithdrawReason::OwnerCancel,
            total_locked: ctx.accounts.registry.total_locked,
            timestamp: now,
        });

        Ok(())
    }

    /// Capability-gated trigger exit: validate the supplied price, evaluate
    /// the trigger, and disburse the escrow to the order owner. The whole
    /// sequence is one instruction, so escrow removal and the status flip
    /// commit together or not at all. The executor can trigger release but
    /// never redirect funds to itself.
    pub fn execute_order(
        ctx: Context<ExecuteOrder>,
        price_mantissa: u64,
        price_exponent: i32,
    ) -> Result<()> {
        require!(!ctx.accounts.config.paused, VaultError::EnginePaused);
        require!(
            ctx.accounts.order.is_pending(),
            VaultError::OrderNotPending
        );

        let execution_price = price::normalize_price(price_mantissa, price_exponent)?;
        require!(
            execution_price >= ctx.accounts.registry.min_price
                && execution_price <= ctx.accounts.registry.max_price,
            VaultError::PriceOutOfRange
        );
        require!(
            price::should_trigger(
                ctx.accounts.order.direction,
                ctx.accounts.order.trigger_price,
                execution_price,
            ),
            VaultError::TriggerNotMet
        );

        // Trigger satisfied: flip the status, then move the funds.
        ctx.accounts.order.mark_executed()?;

        let order_id = ctx.accounts.order.id;
        let beneficiary = ctx.accounts.escrow.owner;
        let amount = ctx.accounts.escrow.balance;
        let registry_bump = ctx.accounts.registry.bump;
        let now = Clock::get()?.unix_timestamp;
        let estimate = price::settlement_value_estimate(amount, execution_price)?;

        let seeds = &[b"registry".as_ref(), &[registry_bump]];
        let signer = &[&seeds[..]];
        let cpi_accounts = Transfer {
            from: ctx.accounts.vault.to_account_info(),
            to: ctx.accounts.owner_token.to_account_info(),
            authority: ctx.accounts.registry.to_account_info(),
        };
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                cpi_accounts,
                signer,
            ),
            amount,
        )?;

        ctx.accounts.registry.record_order_closed(amount)?;

        let receipt = &mut ctx.accounts.receipt;
        receipt.order_id = order_id;
        receipt.owner = beneficiary;
        receipt.amount_released = amount;
        receipt.settlement_value_estimate = estimate;
        receipt.execution_price = execution_price;
        receipt.executed_at = now;
        receipt.bump = ctx.bumps.receipt;

        emit!(OrderExecuted {
            order_id,
            owner: beneficiary,
            execution_price,
            amount_released: amount,
            settlement_value_estimate: estimate,
            timestamp: now,
        });
        emit!(EscrowWithdrawn {
            order_id,
            owner: beneficiary,
            amount,
            reason: WithdrawReason::ExecutorTrigger,
            total_locked: ctx.accounts.registry.total_locked,
            timestamp: now,
        });

        Ok(())
    }

    /// Hand the executor capability to another principal. Only the current
    /// holder can transfer it; there is no way to mint a second one or
    /// recover a lost one short of redeploying.
    pub fn transfer_executor(ctx: Context<TransferExecutor>, new_executor: Pubkey) -> Result<()> {
        let previous_executor = ctx.accounts.config.executor;
        ctx.accounts.config.executor = new_executor;

        emit!(ExecutorTransferred {
            previous_executor,
            new_executor,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Update the execution-price sanity band. Authority-only.
    pub fn update_price_band(
        ctx: Context<UpdatePriceBand>,
        min_price: u64,
        max_price: u64,
    ) -> Result<()> {
        require!(
            min_price > 0 && min_price < max_price,
            VaultError::InvalidPriceBand
        );
        let registry = &mut ctx.accounts.registry;
        registry.min_price = min_price;
        registry.max_price = max_price;
        Ok(())
    }

    /// Pause or resume order creation and execution. Authority-only
    /// (circuit breaker). Cancellation is never paused.
    pub fn set_paused(ctx: Context<SetPaused>, paused: bool) -> Result<()> {
        ctx.accounts.config.paused = paused;
        Ok(())
    }
}

// --- Account structs and validation ---

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = authority,
        space = 8 + Config::LEN,
        seeds = [b"config"],
        bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        init,
        payer = authority,
        space = 8 + Registry::LEN,
        seeds = [b"registry"],
        bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(mut)]
    pub authority: Signer<'info>,

    /// Executor capability holder (the only principal execute_order accepts).
    /// Unchecked: stored for later signature checks.
    /// CHECK: executor pubkey stored in config
    pub executor: UncheckedAccount<'info>,

    pub asset_mint: Account<'info, Mint>,

    #[account(
        constraint = vault.mint == asset_mint.key() @ VaultError::InvalidVault,
        constraint = vault.owner == registry.key() @ VaultError::InvalidVault
    )]
    pub vault: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct CreateOrder<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    #[account(mut)]
    pub owner: Signer<'info>,

    /// PDA: ["order", registry.total_orders_created]. Client derives using
    /// the current counter value.
    #[account(
        init,
        payer = owner,
        space = 8 + Order::LEN,
        seeds = [b"order".as_ref(), registry.total_orders_created.to_le_bytes().as_ref()],
        bump
    )]
    pub order: Account<'info, Order>,

    /// Escrow entry backing the order, same identity seed. A second deposit
    /// against the same identity collides here at the account layer.
    #[account(
        init,
        payer = owner,
        space = 8 + EscrowEntry::LEN,
        seeds = [b"escrow".as_ref(), registry.total_orders_created.to_le_bytes().as_ref()],
        bump
    )]
    pub escrow: Account<'info, EscrowEntry>,

    #[account(
        mut,
        constraint = owner_token.mint == registry.asset_mint,
        constraint = owner_token.owner == owner.key()
    )]
    pub owner_token: Account<'info, TokenAccount>,

    #[account(mut, constraint = vault.key() == registry.vault @ VaultError::InvalidVault)]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct CancelOrder<'info> {
    #[account(mut, seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [b"order", &order.id.to_le_bytes()],
        bump = order.bump,
        constraint = order.owner == owner.key() @ VaultError::NotOrderOwner
    )]
    pub order: Account<'info, Order>,

    #[account(
        mut,
        close = owner,
        seeds = [b"escrow", &order.id.to_le_bytes()],
        bump = escrow.bump,
        constraint = escrow.order_id == order.id @ VaultError::EscrowNotFound
    )]
    pub escrow: Account<'info, EscrowEntry>,

    #[account(
        mut,
        constraint = owner_token.mint == registry.asset_mint,
        constraint = owner_token.owner == owner.key()
    )]
    pub owner_token: Account<'info, TokenAccount>,

    #[account(mut, constraint = vault.key() == registry.vault @ VaultError::InvalidVault)]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ExecuteOrder<'info> {
    #[account(
        seeds = [b"config"],
        bump = config.bump,
        constraint = config.executor == executor.key() @ VaultError::NotAuthorized
    )]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    #[account(mut)]
    pub executor: Signer<'info>,

    #[account(mut, seeds = [b"order", &order.id.to_le_bytes()], bump = order.bump)]
    pub order: Account<'info, Order>,

    /// Beneficiary of the disbursement; also receives the escrow entry rent.
    /// CHECK: validated against the order owner
    #[account(mut, constraint = owner.key() == order.owner @ VaultError::NotOrderOwner)]
    pub owner: UncheckedAccount<'info>,

    #[account(
        mut,
        close = owner,
        seeds = [b"escrow", &order.id.to_le_bytes()],
        bump = escrow.bump,
        constraint = escrow.order_id == order.id @ VaultError::EscrowNotFound
    )]
    pub escrow: Account<'info, EscrowEntry>,

    #[account(
        mut,
        constraint = owner_token.mint == registry.asset_mint,
        constraint = owner_token.owner == order.owner @ VaultError::NotOrderOwner
    )]
    pub owner_token: Account<'info, TokenAccount>,

    #[account(mut, constraint = vault.key() == registry.vault @ VaultError::InvalidVault)]
    pub vault: Account<'info, TokenAccount>,

    /// Immutable audit record; one per executed order, never closed.
    #[account(
        init,
        payer = executor,
        space = 8 + ExecutionReceipt::LEN,
        seeds = [b"receipt".as_ref(), order.id.to_le_bytes().as_ref()],
        bump
    )]
    pub receipt: Account<'info, ExecutionReceipt>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct TransferExecutor<'info> {
    #[account(
        mut,
        seeds = [b"config"],
        bump = config.bump,
        constraint = config.executor == executor.key() @ VaultError::NotAuthorized
    )]
    pub config: Account<'info, Config>,

    pub executor: Signer<'info>,
}

#[derive(Accounts)]
pub struct UpdatePriceBand<'info> {
    #[account(
        seeds = [b"config"],
        bump = config.bump,
        constraint = config.authority == authority.key() @ VaultError::NotAuthorized
    )]
    pub config: Account<'info, Config>,

    #[account(mut, seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct SetPaused<'info> {
    #[account(
        mut,
        seeds = [b"config"],
        bump = config.bump,
        constraint = config.authority == authority.key() @ VaultError::NotAuthorized
    )]
    pub config: Account<'info, Config>,

    pub authority: Signer<'info>,
}
