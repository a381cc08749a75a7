/// Transaction types for ScroogeCoin
use crate::amount::Amount;
use crate::crypto::{Address, KeyPair};
use crate::error::ChainError;
use crate::utxo::Utxo;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type TxHash = [u8; 32];

/// Prefix of every per-input signing message.
const SIGNING_DOMAIN: &[u8] = b"SCROOGE-INPUT:";

/// A claim on an output of an earlier transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    #[serde(with = "hex::serde")]
    pub prev_tx_hash: TxHash,
    pub output_index: u32,
    /// Compact ECDSA signature over `Transaction::raw_data_to_sign` for this input's position.
    #[serde(default, with = "hex_signature")]
    pub signature: Option<Vec<u8>>,
}

/// Hex string for a present signature, `null` for an absent one.
mod hex_signature {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(signature: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match signature {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|encoded| hex::decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}

impl Input {
    pub fn new(prev_tx_hash: TxHash, output_index: u32) -> Self {
        Input {
            prev_tx_hash,
            output_index,
            signature: None,
        }
    }

    /// The pool handle this input claims.
    pub fn utxo(&self) -> Utxo {
        Utxo::new(self.prev_tx_hash, self.output_index)
    }

    pub fn add_signature(&mut self, signature: Vec<u8>) {
        self.signature = Some(signature);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: Amount,
    pub address: Address,
}

impl Output {
    pub fn new(value: Amount, address: Address) -> Self {
        Output { value, address }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_le_bytes());
        encode_bytes(buf, self.address.as_bytes());
    }
}

/// A transfer of value from claimed outputs to new outputs.
///
/// The hash is only meaningful once [`Transaction::finalize`] has been called
/// after the last input, output or signature change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(with = "hex::serde")]
    hash: TxHash,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    pub fn new() -> Self {
        Transaction {
            hash: [0; 32],
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// A finalized transaction with no inputs paying `value` to `address`.
    ///
    /// Two coinbase transactions with the same value and address share a hash;
    /// put several outputs in one genesis transaction instead.
    pub fn coinbase(value: Amount, address: Address) -> Self {
        let mut tx = Self::new();
        tx.add_output(value, address);
        tx.finalize();
        tx
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&Input> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn add_input(&mut self, prev_tx_hash: TxHash, output_index: u32) {
        self.inputs.push(Input::new(prev_tx_hash, output_index));
    }

    pub fn add_output(&mut self, value: Amount, address: Address) {
        self.outputs.push(Output::new(value, address));
    }

    pub fn remove_input(&mut self, index: usize) -> Option<Input> {
        if index < self.inputs.len() {
            Some(self.inputs.remove(index))
        } else {
            None
        }
    }

    /// Removes the first input claiming `utxo`.
    pub fn remove_input_utxo(&mut self, utxo: &Utxo) -> Option<Input> {
        let index = self.inputs.iter().position(|input| &input.utxo() == utxo)?;
        Some(self.inputs.remove(index))
    }

    pub fn add_signature(&mut self, signature: Vec<u8>, index: usize) -> Result<(), ChainError> {
        let input_count = self.inputs.len();
        let input = self.inputs.get_mut(index).ok_or_else(|| {
            ChainError::InvalidTransaction(format!(
                "Cannot sign input {}: transaction has {} inputs",
                index, input_count
            ))
        })?;
        input.add_signature(signature);
        Ok(())
    }

    /// Signs input `index` with `keypair`.
    pub fn sign_input(&mut self, index: usize, keypair: &KeyPair) -> Result<(), ChainError> {
        let signature = keypair.sign(&self.raw_data_to_sign(index));
        self.add_signature(signature, index)
    }

    /// Message the owner of the output claimed by input `index` signs.
    ///
    /// Covers the input position, every input's claim and every output. It carries
    /// no signature bytes, so inputs may be signed in any order.
    pub fn raw_data_to_sign(&self, index: usize) -> Vec<u8> {
        let mut message = Vec::new();
        message.extend_from_slice(SIGNING_DOMAIN);
        message.extend_from_slice(&(index as u32).to_le_bytes());
        message.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            message.extend_from_slice(&input.prev_tx_hash);
            message.extend_from_slice(&input.output_index.to_le_bytes());
        }
        message.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            output.encode_into(&mut message);
        }
        message
    }

    /// Canonical encoding of the whole transaction, signatures included.
    pub fn raw_tx(&self) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            raw.extend_from_slice(&input.prev_tx_hash);
            raw.extend_from_slice(&input.output_index.to_le_bytes());
            match &input.signature {
                Some(signature) => {
                    raw.push(1);
                    encode_bytes(&mut raw, signature);
                }
                None => raw.push(0),
            }
        }
        raw.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            output.encode_into(&mut raw);
        }
        raw
    }

    /// Computes and stores the transaction hash.
    pub fn finalize(&mut self) {
        self.hash = Sha256::digest(self.raw_tx()).into();
    }

    /// The pool entries this transaction creates once accepted.
    pub fn created_utxos(&self) -> impl Iterator<Item = (Utxo, &Output)> + '_ {
        self.outputs
            .iter()
            .enumerate()
            .map(move |(index, output)| (Utxo::new(self.hash, index as u32), output))
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}
