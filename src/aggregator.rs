use alloy::primitives::I256;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{TokenBalance, TokenTransfer, DEFAULT_DECIMALS, NATIVE_CONTRACT};
use crate::units::{format_units, widen, U512, DISPLAY_PRECISION};

/// Running totals for one contract. Kept as two unsigned sums so the full
/// `U256` range folds without clamping in either direction.
#[derive(Default)]
struct Ledger {
    credit: U512,
    debit: U512,
}

impl Ledger {
    fn net(&self) -> Option<U512> {
        (self.credit > self.debit).then(|| self.credit - self.debit)
    }
}

/// Fold transfers for `address` into one holding per contract.
///
/// Incoming transfers add, outgoing subtract; rows where the address is on
/// neither side, or with no contract address, are ignored. A positive
/// `native_balance` adds a synthetic `native` entry. Only strictly positive
/// balances survive, ordered by [`sort_balances`].
pub fn aggregate_token_balances(
    address: &str,
    transfers: &[TokenTransfer],
    native_balance: I256,
) -> Vec<TokenBalance> {
    let address = address.to_ascii_lowercase();

    // insertion-ordered running balances
    let mut order: Vec<String> = Vec::new();
    let mut running: HashMap<String, Ledger> = HashMap::new();

    for transfer in transfers {
        let Some(contract) = transfer.contract_address.as_deref() else {
            continue;
        };
        let contract = contract.to_ascii_lowercase();

        let incoming = transfer.to_address.eq_ignore_ascii_case(&address);
        let outgoing = transfer.from_address.eq_ignore_ascii_case(&address);
        if !incoming && !outgoing {
            debug!(
                "ignoring transfer {} that does not touch {}",
                transfer.transaction_hash, address
            );
            continue;
        }

        let ledger = running.entry(contract.clone()).or_insert_with(|| {
            order.push(contract);
            Ledger::default()
        });
        let value = widen(transfer.value);
        if incoming {
            ledger.credit = ledger.credit.saturating_add(value);
        } else {
            ledger.debit = ledger.debit.saturating_add(value);
        }
    }

    let mut balances: Vec<TokenBalance> = order
        .into_iter()
        .filter_map(|contract| {
            let net = running.get(&contract)?.net()?;
            Some(token_entry(contract, net))
        })
        .collect();

    if native_balance.is_positive() {
        balances.retain(|b| b.contract_address != NATIVE_CONTRACT);
        balances.push(native_entry(widen(native_balance.into_raw())));
    }

    sort_balances(&mut balances);
    balances
}

fn token_entry(contract: String, raw: U512) -> TokenBalance {
    TokenBalance {
        contract_address: contract,
        symbol: None,
        name: None,
        balance: raw.to_string(),
        balance_formatted: format_units(raw, DEFAULT_DECIMALS, DISPLAY_PRECISION),
        usd_value: None,
        decimals: DEFAULT_DECIMALS,
        is_native: false,
    }
}

fn native_entry(raw: U512) -> TokenBalance {
    TokenBalance {
        contract_address: NATIVE_CONTRACT.to_string(),
        symbol: Some("ETH".to_string()),
        name: Some("Ethereum".to_string()),
        balance: raw.to_string(),
        balance_formatted: format_units(raw, DEFAULT_DECIMALS, DISPLAY_PRECISION),
        usd_value: None,
        decimals: DEFAULT_DECIMALS,
        is_native: true,
    }
}

/// Descending by USD value when every entry has one, otherwise descending by
/// raw balance. Stable, so ties keep insertion order.
pub fn sort_balances(balances: &mut [TokenBalance]) {
    let all_priced = balances.iter().all(|b| b.usd_value.is_some());
    if all_priced {
        balances.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
    } else {
        balances.sort_by(|a, b| b.raw_balance().cmp(&a.raw_balance()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use rust_decimal::Decimal;

    const ME: &str = "0x00000000000000000000000000000000000000aa";
    const OTHER: &str = "0x00000000000000000000000000000000000000bb";
    const TOKEN_A: &str = "0x000000000000000000000000000000000000000a";
    const TOKEN_B: &str = "0x000000000000000000000000000000000000000b";

    fn transfer(contract: Option<&str>, from: &str, to: &str, value: u128) -> TokenTransfer {
        TokenTransfer {
            transaction_hash: "0xhash".to_string(),
            block_timestamp: "1700000000".to_string(),
            contract_address: contract.map(str::to_string),
            from_address: from.to_string(),
            to_address: to.to_string(),
            value: U256::from(value),
        }
    }

    #[test]
    fn single_incoming_transfer_becomes_a_holding() {
        let transfers = [transfer(Some(TOKEN_A), OTHER, ME, 1_000_000_000_000_000_000)];
        let balances = aggregate_token_balances(ME, &transfers, I256::ZERO);

        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].contract_address, TOKEN_A);
        assert_eq!(balances[0].balance, "1000000000000000000");
        assert_eq!(balances[0].balance_formatted, "1.0000");
        assert_eq!(balances[0].decimals, 18);
        assert!(!balances[0].is_native);
    }

    #[test]
    fn zero_and_negative_nets_are_dropped() {
        let transfers = [
            transfer(Some(TOKEN_A), OTHER, ME, 10),
            transfer(Some(TOKEN_A), ME, OTHER, 10),
            transfer(Some(TOKEN_B), ME, OTHER, 5),
        ];
        let balances = aggregate_token_balances(ME, &transfers, I256::ZERO);
        assert!(balances.is_empty());
    }

    #[test]
    fn contract_casing_collapses_into_one_entry() {
        let upper = TOKEN_A.to_uppercase().replacen("0X", "0x", 1);
        let transfers = [
            transfer(Some(TOKEN_A), OTHER, ME, 3),
            transfer(Some(&upper), OTHER, &ME.to_uppercase().replacen("0X", "0x", 1), 4),
        ];
        let balances = aggregate_token_balances(ME, &transfers, I256::ZERO);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].balance, "7");
    }

    #[test]
    fn unrelated_and_contractless_rows_are_ignored() {
        let transfers = [
            transfer(None, OTHER, ME, 100),
            transfer(Some(TOKEN_A), OTHER, OTHER, 100),
            transfer(Some(TOKEN_B), OTHER, ME, 1),
        ];
        let balances = aggregate_token_balances(ME, &transfers, I256::ZERO);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].contract_address, TOKEN_B);
    }

    #[test]
    fn native_balance_only_when_positive() {
        let native = I256::from_dec_str("2000000000000000000").unwrap();
        let balances = aggregate_token_balances(ME, &[], native);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].contract_address, NATIVE_CONTRACT);
        assert_eq!(balances[0].symbol.as_deref(), Some("ETH"));
        assert!(balances[0].is_native);
        assert_eq!(balances[0].balance_formatted, "2.0000");

        let negative = I256::from_dec_str("-1").unwrap();
        assert!(aggregate_token_balances(ME, &[], negative).is_empty());
        assert!(aggregate_token_balances(ME, &[], I256::ZERO).is_empty());
    }

    #[test]
    fn sorted_by_raw_balance_with_stable_ties() {
        let transfers = [
            transfer(Some(TOKEN_A), OTHER, ME, 5),
            transfer(Some(TOKEN_B), OTHER, ME, 50),
            transfer(Some(OTHER), OTHER, ME, 5),
        ];
        let balances = aggregate_token_balances(ME, &transfers, I256::from_dec_str("5").unwrap());
        let order: Vec<&str> = balances.iter().map(|b| b.contract_address.as_str()).collect();
        assert_eq!(order, vec![TOKEN_B, TOKEN_A, OTHER, NATIVE_CONTRACT]);
    }

    #[test]
    fn usd_ordering_applies_only_when_every_entry_is_priced() {
        let mut balances = vec![
            token_entry(TOKEN_A.to_string(), U512::from(100u64)),
            token_entry(TOKEN_B.to_string(), U512::from(1u64)),
        ];
        balances[0].usd_value = Some(Decimal::new(5, 0));
        balances[1].usd_value = Some(Decimal::new(50, 0));
        sort_balances(&mut balances);
        assert_eq!(balances[0].contract_address, TOKEN_B);

        balances[0].usd_value = None;
        sort_balances(&mut balances);
        assert_eq!(balances[0].contract_address, TOKEN_A);
    }

    #[test]
    fn no_output_entry_is_ever_non_positive() {
        let mut transfers = Vec::new();
        for i in 0..50u128 {
            let contract = if i % 3 == 0 { TOKEN_A } else { TOKEN_B };
            if i % 2 == 0 {
                transfers.push(transfer(Some(contract), OTHER, ME, i * 7));
            } else {
                transfers.push(transfer(Some(contract), ME, OTHER, i * 11));
            }
        }
        for balance in aggregate_token_balances(ME, &transfers, I256::ZERO) {
            assert!(balance.raw_balance() > U512::ZERO);
        }
    }

    #[test]
    fn extreme_values_fold_without_clamping() {
        let mut max_in = transfer(Some(TOKEN_A), OTHER, ME, 0);
        max_in.value = U256::MAX;
        let mut max_out = transfer(Some(TOKEN_A), ME, OTHER, 0);
        max_out.value = U256::MAX;
        let transfers = [max_in.clone(), transfer(Some(TOKEN_A), OTHER, ME, 1), max_out];

        let balances = aggregate_token_balances(ME, &transfers, I256::ZERO);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].balance, "1");

        // two maximal credits exceed U256 and are still reported exactly
        let doubled = aggregate_token_balances(ME, &[max_in.clone(), max_in], I256::ZERO);
        let expected = widen(U256::MAX) + widen(U256::MAX);
        assert_eq!(doubled[0].balance, expected.to_string());
        assert_eq!(doubled[0].raw_balance(), expected);
    }
}
