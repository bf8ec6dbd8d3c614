use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    // ============================================
    // INITIALIZATION ERRORS (1-9)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,

    // ============================================
    // AUTHORIZATION ERRORS (10-19)
    // ============================================
    /// Caller is not the party the operation requires
    Unauthorized = 10,

    // ============================================
    // PARAMETER ERRORS (20-29)
    // ============================================
    /// Non-positive amount or duration, zero interval or curve parameter,
    /// identical parties, start in the past, or arithmetic overflow
    InvalidParameters = 20,
    /// Fee above `MAX_FEE_BPS`
    FeeTooHigh = 21,

    // ============================================
    // LOOKUP ERRORS (30-39)
    // ============================================
    StreamNotFound = 30,
    SwapNotFound = 31,

    // ============================================
    // FUNDS ERRORS (40-49)
    // ============================================
    /// Funding account cannot cover the debit
    InsufficientBalance = 40,
    /// Requested withdrawal exceeds the released, unwithdrawn amount
    InsufficientAvailable = 41,

    // ============================================
    // STATUS ERRORS (50-59)
    // ============================================
    /// Operation requires an `Active` stream
    StreamNotActive = 50,
    /// Stream is `Cancelled` or `Completed`
    AlreadyTerminal = 51,
    /// Resume requires a `Paused` stream
    StreamNotPaused = 52,

    // ============================================
    // POLICY ERRORS (60-69)
    // ============================================
    /// Asset is not on the allow-list
    AssetNotAllowed = 60,
    /// Asset is on the deny-list
    AssetDenied = 61,
    /// Token contract does not implement the token interface
    AssetNonConforming = 62,
    /// Ledger is under a global emergency pause
    ContractPaused = 63,

    // ============================================
    // TRANSFER ERRORS (70-79)
    // ============================================
    /// The token contract rejected a transfer
    AssetTransferFailed = 70,

    // ============================================
    // MODIFICATION ERRORS (80-89)
    // ============================================
    NoActiveProposal = 80,
    ProposalExpired = 81,

    // ============================================
    // SWAP ERRORS (90-99)
    // ============================================
    /// Stream was created with `allow_swaps = false`
    SwapsDisabled = 90,
    SwapExpired = 91,
    /// A swap already executed for this proposal or stream
    SwapAlreadyExecuted = 92,
    /// Proposal was invalidated
    SwapInactive = 93,
}
