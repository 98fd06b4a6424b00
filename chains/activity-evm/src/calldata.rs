use primitive_types::U256;

/// `transfer(address,uint256)`
pub(crate) const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// `approve(address,uint256)`
pub(crate) const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
/// `transferFrom(address,address,uint256)`
pub(crate) const TRANSFER_FROM_SELECTOR: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

const WORD: usize = 32;

/// A top level call recognized from its calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    /// No calldata, a plain value transfer
    Plain,
    Transfer {
        to: String,
        amount: String,
    },
    Approve {
        spender: String,
        amount: String,
    },
    TransferFrom {
        from: String,
        to: String,
        amount: String,
    },
    /// Some other method, identified by its selector
    Other([u8; 4]),
}

impl Call {
    /// Decodes hex calldata. Returns `None` when it is not valid hex or the
    /// arguments of a known selector are truncated.
    pub(crate) fn decode(raw_input: &str) -> Option<Self> {
        let bytes = hex::decode(raw_input.trim_start_matches("0x")).ok()?;
        if bytes.len() < 4 {
            return Some(Call::Plain);
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&bytes[..4]);
        let args = &bytes[4..];
        let call = match selector {
            TRANSFER_SELECTOR => Call::Transfer {
                to: address_arg(args, 0)?,
                amount: amount_arg(args, 1)?,
            },
            APPROVE_SELECTOR => Call::Approve {
                spender: address_arg(args, 0)?,
                amount: amount_arg(args, 1)?,
            },
            TRANSFER_FROM_SELECTOR => Call::TransferFrom {
                from: address_arg(args, 0)?,
                to: address_arg(args, 1)?,
                amount: amount_arg(args, 2)?,
            },
            other => Call::Other(other),
        };
        Some(call)
    }

    /// Method name for calls that are not decoded further
    pub(crate) fn method_name(&self) -> Option<String> {
        match self {
            Call::Plain => None,
            Call::Transfer { .. } => Some("transfer".into()),
            Call::Approve { .. } => Some("approve".into()),
            Call::TransferFrom { .. } => Some("transferFrom".into()),
            Call::Other(selector) => Some(format!("0x{}", hex::encode(selector))),
        }
    }
}

fn word(args: &[u8], position: usize) -> Option<&[u8]> {
    args.get(position * WORD..(position + 1) * WORD)
}

fn address_arg(args: &[u8], position: usize) -> Option<String> {
    word(args, position).map(|w| format!("0x{}", hex::encode(&w[WORD - 20..])))
}

fn amount_arg(args: &[u8], position: usize) -> Option<String> {
    word(args, position).map(|w| U256::from_big_endian(w).to_string())
}

/// Addresses are compared without regard to checksum casing
pub(crate) fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOB: &str = "000000000000000000000000b0b0000000000000000000000000000000000001";

    #[test]
    fn test_decodes_approve_with_unlimited_allowance() {
        let input = format!("0x095ea7b3{BOB}{}", "f".repeat(64));
        let call = Call::decode(&input).unwrap();
        assert_eq!(
            call,
            Call::Approve {
                spender: "0xb0b0000000000000000000000000000000000001".into(),
                amount: U256::MAX.to_string(),
            }
        );
    }

    #[test]
    fn test_decodes_transfer_and_plain_calls() {
        let input = format!("0xa9059cbb{BOB}{:064x}", 1500u64);
        assert_eq!(
            Call::decode(&input),
            Some(Call::Transfer {
                to: "0xb0b0000000000000000000000000000000000001".into(),
                amount: "1500".into(),
            })
        );
        assert_eq!(Call::decode("0x"), Some(Call::Plain));
        assert_eq!(
            Call::decode("0xdeadbeef").and_then(|c| c.method_name()),
            Some("0xdeadbeef".to_owned())
        );
    }

    #[test]
    fn test_truncated_arguments_do_not_decode() {
        assert_eq!(Call::decode(&format!("0xa9059cbb{BOB}")), None);
        assert_eq!(Call::decode("0xzz"), None);
    }
}
