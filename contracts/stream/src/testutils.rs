use soroban_sdk::{
    contract, contractimpl,
    testutils::{Address as _, Ledger},
    token::{Client as TokenClient, StellarAssetClient},
    Address, Env, String,
};

use crate::{
    AssetRef, CreateStreamParams, CurveKind, IntervalUnit, StreamLedger, StreamLedgerClient,
};

pub const STARTING_BALANCE: i128 = 10_000_000;

pub struct TestContext {
    pub env: Env,
    pub contract_id: Address,
    pub native_id: Address,
    pub admin: Address,
    pub treasury: Address,
    pub sender: Address,
    pub recipient: Address,
}

impl TestContext {
    pub fn setup() -> Self {
        Self::setup_with_fee(0)
    }

    pub fn setup_with_fee(fee_bps: u32) -> Self {
        let env = Env::default();
        env.mock_all_auths();

        let contract_id = env.register_contract(None, StreamLedger);

        // Stellar asset contract standing in for the native asset.
        let issuer = Address::generate(&env);
        let native_id = env
            .register_stellar_asset_contract_v2(issuer)
            .address();

        let admin = Address::generate(&env);
        let treasury = Address::generate(&env);
        let sender = Address::generate(&env);
        let recipient = Address::generate(&env);

        let client = StreamLedgerClient::new(&env, &contract_id);
        client.init(&admin, &native_id, &treasury, &fee_bps);

        StellarAssetClient::new(&env, &native_id).mint(&sender, &STARTING_BALANCE);

        TestContext {
            env,
            contract_id,
            native_id,
            admin,
            treasury,
            sender,
            recipient,
        }
    }

    pub fn client(&self) -> StreamLedgerClient<'_> {
        StreamLedgerClient::new(&self.env, &self.contract_id)
    }

    pub fn native(&self) -> TokenClient<'_> {
        TokenClient::new(&self.env, &self.native_id)
    }

    pub fn set_time(&self, timestamp: u64) {
        self.env.ledger().set_timestamp(timestamp);
    }

    /// Deploys a fresh asset contract, funds the sender and registers it.
    pub fn register_external_token(&self) -> Address {
        let issuer = Address::generate(&self.env);
        let token_id = self
            .env
            .register_stellar_asset_contract_v2(issuer)
            .address();
        StellarAssetClient::new(&self.env, &token_id).mint(&self.sender, &STARTING_BALANCE);
        self.client().register_asset(&token_id);
        token_id
    }

    pub fn linear_params(
        &self,
        total_amount: i128,
        rate: i128,
        duration: u64,
    ) -> CreateStreamParams {
        CreateStreamParams {
            recipient: self.recipient.clone(),
            total_amount,
            rate_per_interval: rate,
            interval: IntervalUnit::Second,
            duration,
            curve: CurveKind::Linear,
            curve_param: 0,
            asset: AssetRef::Native,
            start_time: None,
            allow_swaps: false,
        }
    }

    /// 1_000_000 units at 1_000 per tick over 1_000 ticks, starting at t=0.
    pub fn create_default_stream(&self) -> u64 {
        self.set_time(0);
        self.client()
            .create_stream(&self.sender, &self.linear_params(1_000_000, 1_000, 1_000))
    }

    /// Same terms as the default stream with swaps enabled.
    pub fn create_swappable_stream(&self) -> u64 {
        self.set_time(0);
        let mut params = self.linear_params(1_000_000, 1_000, 1_000);
        params.allow_swaps = true;
        self.client().create_stream(&self.sender, &params)
    }

    /// Sum of every balance the ledger can move funds between.
    pub fn native_supply(&self) -> i128 {
        let token = self.native();
        token.balance(&self.sender)
            + token.balance(&self.recipient)
            + token.balance(&self.treasury)
            + token.balance(&self.contract_id)
    }
}

/// Answers the token metadata and balance queries but refuses every transfer.
#[contract]
pub struct RejectingToken;

#[contractimpl]
impl RejectingToken {
    pub fn balance(_env: Env, _id: Address) -> i128 {
        i128::MAX
    }

    pub fn transfer(_env: Env, _from: Address, _to: Address, _amount: i128) {
        panic!("transfers are disabled");
    }

    pub fn decimals(_env: Env) -> u32 {
        7
    }

    pub fn name(env: Env) -> String {
        String::from_str(&env, "Rejecting Token")
    }

    pub fn symbol(env: Env) -> String {
        String::from_str(&env, "REJ")
    }
}

/// A contract that does not implement the token interface at all.
#[contract]
pub struct NotAToken;

#[contractimpl]
impl NotAToken {
    pub fn ping(_env: Env) -> u32 {
        1
    }
}
