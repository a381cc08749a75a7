/// Validation logic for transactions separated from type definitions
use crate::amount::{self, Amount, ZERO};
use crate::crypto::SignatureVerifier;
use crate::error::TxRejection;
use crate::transaction::types::Transaction;
use crate::utxo::{Utxo, UtxoPool};
use std::collections::HashSet;

impl Transaction {
    /// Checks this transaction against a pool snapshot without touching it.
    ///
    /// Inputs are checked in order (claimed output present, not claimed twice,
    /// signature valid), then outputs (non-negative), then the value balance.
    /// The first failure is returned. On success the implicit fee is returned.
    pub fn validate_against<V>(&self, pool: &UtxoPool, verifier: &V) -> Result<Amount, TxRejection>
    where
        V: SignatureVerifier + ?Sized,
    {
        let mut claimed: HashSet<Utxo> = HashSet::with_capacity(self.num_inputs());
        let mut input_values = Vec::with_capacity(self.num_inputs());

        for (index, input) in self.inputs().iter().enumerate() {
            let utxo = input.utxo();
            let claimed_output = pool
                .get(&utxo)
                .ok_or(TxRejection::MissingUtxo { input: index, utxo })?;

            if !claimed.insert(utxo) {
                return Err(TxRejection::DoubleClaim { input: index, utxo });
            }

            let signature = input
                .signature
                .as_deref()
                .ok_or(TxRejection::SignatureInvalid { input: index, utxo })?;
            let message = self.raw_data_to_sign(index);
            if !verifier.verify(&claimed_output.address, &message, signature) {
                return Err(TxRejection::SignatureInvalid { input: index, utxo });
            }

            input_values.push(claimed_output.value);
        }

        for (index, output) in self.outputs().iter().enumerate() {
            if output.value < ZERO {
                return Err(TxRejection::NegativeOutput {
                    output: index,
                    value: output.value,
                });
            }
        }

        let inputs = amount::checked_sum(input_values.iter().copied());
        let outputs = amount::checked_sum(self.outputs().iter().map(|o| o.value));
        match (inputs, outputs) {
            (Some(inputs), Some(outputs)) if inputs >= outputs => Ok(inputs - outputs),
            _ => Err(TxRejection::ValueImbalance {
                inputs: inputs.unwrap_or(Amount::MAX),
                outputs: outputs.unwrap_or(Amount::MAX),
            }),
        }
    }

    pub fn is_valid_against<V>(&self, pool: &UtxoPool, verifier: &V) -> bool
    where
        V: SignatureVerifier + ?Sized,
    {
        self.validate_against(pool, verifier).is_ok()
    }
}
