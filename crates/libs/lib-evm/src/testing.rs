//! In-memory node and wallet for tests.
//!
//! [`MockTransport`] behaves like a tiny dev chain: it remembers bytecode,
//! token balances and sent transactions, mines every transaction instantly
//! and can be told that calls to a given function revert. [`MockWallet`]
//! signs by handing transactions to that node. Both record every request in
//! one shared, ordered history so tests can assert on call sequencing.

use crate::error::RpcError;
use crate::rpc::RpcTransport;
use crate::wallet::{ProviderEvent, WalletProvider};
use alloy_primitives::{address, hex, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};

pub const ALICE: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const BOB: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const STABLECOIN: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const VAULT: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

/// Who handled a recorded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Node,
    Wallet,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub source: Source,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone)]
pub struct SentTx {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

impl SentTx {
    pub fn selector(&self) -> [u8; 4] {
        selector_of(&self.data)
    }
}

type Reply = Result<Value, RpcError>;

#[derive(Default)]
struct Script {
    once: HashMap<String, VecDeque<Reply>>,
    always: HashMap<String, Reply>,
}

impl Script {
    fn next(&mut self, method: &str) -> Option<Reply> {
        if let Some(reply) = self.once.get_mut(method).and_then(VecDeque::pop_front) {
            return Some(reply);
        }
        self.always.get(method).cloned()
    }
}

fn selector_of(data: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    if data.len() >= 4 {
        selector.copy_from_slice(&data[..4]);
    }
    selector
}

fn word(value: U256) -> Value {
    json!(hex::encode_prefixed(value.to_be_bytes::<32>()))
}

/// Scripted JSON-RPC node.
pub struct MockTransport {
    script: Mutex<Script>,
    code: Mutex<HashMap<Address, String>>,
    balances: Mutex<HashMap<(Address, Address), U256>>,
    call_results: Mutex<HashMap<(Address, [u8; 4]), Reply>>,
    reverts: Mutex<HashMap<(Address, [u8; 4]), RpcError>>,
    sent: Mutex<Vec<SentTx>>,
    history: Mutex<Vec<RecordedCall>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script::default()),
            code: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            call_results: Mutex::new(HashMap::new()),
            reverts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        })
    }

    /// Every later `method` request returns `value`.
    pub fn respond(&self, method: &str, value: Value) {
        self.script.lock().always.insert(method.to_string(), Ok(value));
    }

    /// The next `method` request returns `value`.
    pub fn respond_once(&self, method: &str, value: Value) {
        self.script
            .lock()
            .once
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(value));
    }

    pub fn fail(&self, method: &str, err: RpcError) {
        self.script.lock().always.insert(method.to_string(), Err(err));
    }

    pub fn fail_once(&self, method: &str, err: RpcError) {
        self.script
            .lock()
            .once
            .entry(method.to_string())
            .or_default()
            .push_back(Err(err));
    }

    pub fn respond_code(&self, address: Address, code: &str) {
        self.code.lock().insert(address, code.to_string());
    }

    pub fn set_balance(&self, token: Address, holder: Address, amount: U256) {
        self.balances.lock().insert((token, holder), amount);
    }

    /// `eth_call` of `selector` on `to` returns `amount` as one ABI word.
    pub fn respond_call(&self, to: Address, selector: [u8; 4], amount: U256) {
        self.call_results.lock().insert((to, selector), Ok(word(amount)));
    }

    /// Transactions calling `selector` on `to` are mined with status 0 and
    /// replaying them with `eth_call` fails with `err`.
    pub fn revert_on(&self, to: Address, selector: [u8; 4], err: RpcError) {
        self.reverts.lock().insert((to, selector), err);
    }

    /// Park every `eth_call` until [`release_calls`](Self::release_calls).
    pub fn hold_calls(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_calls(&self, count: usize) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(count);
        }
    }

    /// Number of node requests for `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.count(Source::Node, method)
    }

    pub fn history(&self) -> Vec<RecordedCall> {
        self.history.lock().clone()
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.sent.lock().clone()
    }

    fn count(&self, source: Source, method: &str) -> usize {
        self.history
            .lock()
            .iter()
            .filter(|c| c.source == source && c.method == method)
            .count()
    }

    fn last_params_of(&self, source: Source, method: &str) -> Option<Value> {
        self.history
            .lock()
            .iter()
            .rev()
            .find(|c| c.source == source && c.method == method)
            .map(|c| c.params.clone())
    }

    fn record(&self, source: Source, method: &str, params: &Value) {
        self.history.lock().push(RecordedCall {
            source,
            method: method.to_string(),
            params: params.clone(),
        });
    }

    fn accept_transaction(&self, params: &Value) -> Reply {
        let tx = params
            .get(0)
            .ok_or_else(|| RpcError::rpc(-32602, "missing transaction"))?;
        let parse_address = |field: &str| {
            tx.get(field)
                .and_then(Value::as_str)
                .and_then(|s| Address::from_str(s).ok())
                .ok_or_else(|| RpcError::rpc(-32602, format!("invalid {}", field)))
        };
        let from = parse_address("from")?;
        let to = parse_address("to")?;
        let data = tx
            .get("data")
            .and_then(Value::as_str)
            .and_then(|s| hex::decode(s).ok())
            .map(Bytes::from)
            .unwrap_or_default();

        let mut sent = self.sent.lock();
        let nonce = sent.len() as u64 + 1;
        let hash = B256::left_padding_from(&nonce.to_be_bytes());
        sent.push(SentTx { hash, from, to, data });
        Ok(json!(hash))
    }

    fn receipt(&self, params: &Value) -> Reply {
        let hash = params
            .get(0)
            .and_then(Value::as_str)
            .and_then(|s| B256::from_str(s).ok())
            .ok_or_else(|| RpcError::rpc(-32602, "invalid hash"))?;

        let reverted = self
            .sent
            .lock()
            .iter()
            .find(|tx| tx.hash == hash)
            .map(|tx| self.reverts.lock().contains_key(&(tx.to, tx.selector())))
            .unwrap_or(false);

        Ok(json!({
            "transactionHash": hash,
            "blockNumber": "0x1",
            "status": if reverted { "0x0" } else { "0x1" },
            "gasUsed": "0x5208",
        }))
    }

    fn call(&self, params: &Value) -> Reply {
        let tx = params.get(0).cloned().unwrap_or(Value::Null);
        let to = tx
            .get("to")
            .and_then(Value::as_str)
            .and_then(|s| Address::from_str(s).ok())
            .ok_or_else(|| RpcError::rpc(-32602, "invalid to"))?;
        let data = tx
            .get("data")
            .and_then(Value::as_str)
            .and_then(|s| hex::decode(s).ok())
            .unwrap_or_default();
        let selector = selector_of(&data);

        if let Some(err) = self.reverts.lock().get(&(to, selector)) {
            return Err(err.clone());
        }
        if let Some(reply) = self.call_results.lock().get(&(to, selector)) {
            return reply.clone();
        }
        if selector == crate::contracts::IERC20::balanceOfCall::SELECTOR && data.len() >= 36 {
            let holder = Address::from_slice(&data[16..36]);
            let amount = self
                .balances
                .lock()
                .get(&(to, holder))
                .copied()
                .unwrap_or(U256::ZERO);
            return Ok(word(amount));
        }
        Ok(word(U256::ZERO))
    }

    fn default_reply(&self, method: &str, params: &Value) -> Reply {
        match method {
            "eth_chainId" => Ok(json!("0x7a69")),
            "eth_blockNumber" => Ok(json!("0x1")),
            "eth_accounts" => Ok(json!([ALICE])),
            "eth_getCode" => {
                let address = params
                    .get(0)
                    .and_then(Value::as_str)
                    .and_then(|s| Address::from_str(s).ok());
                let code = address
                    .and_then(|a| self.code.lock().get(&a).cloned())
                    .unwrap_or_else(|| "0x".to_string());
                Ok(json!(code))
            }
            "eth_call" => self.call(params),
            "eth_sendTransaction" => self.accept_transaction(params),
            "eth_getTransactionReceipt" => self.receipt(params),
            other => Err(RpcError::rpc(-32601, format!("the method {} does not exist", other))),
        }
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.record(Source::Node, method, &params);

        if method == "eth_call" {
            let gate = self.gate.lock().clone();
            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        }

        let scripted = self.script.lock().next(method);
        match scripted {
            Some(reply) => reply,
            None => self.default_reply(method, &params),
        }
    }
}

/// Scripted wallet that signs through a [`MockTransport`].
pub struct MockWallet {
    node: Arc<MockTransport>,
    script: Mutex<Script>,
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<u64>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWallet {
    /// Wallet exposing [`ALICE`] on chain 31337.
    pub fn new(node: Arc<MockTransport>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            node,
            script: Mutex::new(Script::default()),
            accounts: Mutex::new(vec![ALICE]),
            chain_id: Mutex::new(31337),
            events,
        })
    }

    pub fn with_accounts(self: Arc<Self>, accounts: Vec<Address>) -> Arc<Self> {
        *self.accounts.lock() = accounts;
        self
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock() = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        *self.chain_id.lock() = chain_id;
    }

    pub fn fail(&self, method: &str, err: RpcError) {
        self.script.lock().always.insert(method.to_string(), Err(err));
    }

    pub fn fail_once(&self, method: &str, err: RpcError) {
        self.script
            .lock()
            .once
            .entry(method.to_string())
            .or_default()
            .push_back(Err(err));
    }

    /// Push an event to every subscriber.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Number of wallet requests for `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.node.count(Source::Wallet, method)
    }

    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.node.last_params_of(Source::Wallet, method)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.node.record(Source::Wallet, method, &params);

        let scripted = self.script.lock().next(method);
        if let Some(reply) = scripted {
            return reply;
        }

        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(self.accounts.lock().clone())),
            "eth_chainId" => Ok(json!(format!("0x{:x}", *self.chain_id.lock()))),
            "wallet_switchEthereumChain" | "wallet_addEthereumChain" => Ok(Value::Null),
            "eth_sendTransaction" => self.node.accept_transaction(&params),
            other => Err(RpcError::rpc(4200, format!("Unsupported method {}", other))),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
