//! Contract ABI bindings.
//!
//! Only the functions the client calls are declared. The vault is an
//! ERC-4626-style contract that is also the ERC-20 share token, so share
//! balances and share approvals go through [`IERC20`] at the vault address.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall, SolError};

sol! {
    /// Standard ERC-20 subset.
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }

    /// Testnet stablecoin with an open mint.
    interface IMockStablecoin {
        function mint(address to, uint256 amount) external;
    }

    /// Vault entry points.
    interface IVault {
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function withdraw(uint256 assets, address receiver, address owner) external returns (uint256 shares);
        function totalAssets() external view returns (uint256 totalManagedAssets);
        function convertToAssets(uint256 shares) external view returns (uint256 assets);
        function previewWithdraw(uint256 assets) external view returns (uint256 shares);

        error InsufficientShares();
    }
}

/// `balanceOf(holder)` calldata.
pub fn balance_of(holder: Address) -> Bytes {
    IERC20::balanceOfCall { account: holder }.abi_encode().into()
}

/// `approve(spender, amount)` calldata.
pub fn approve(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

/// `mint(to, amount)` calldata.
pub fn mint(to: Address, amount: U256) -> Bytes {
    IMockStablecoin::mintCall { to, amount }.abi_encode().into()
}

/// `deposit(assets, receiver)` calldata.
pub fn deposit(assets: U256, receiver: Address) -> Bytes {
    IVault::depositCall { assets, receiver }.abi_encode().into()
}

/// `withdraw(assets, receiver, owner)` calldata.
pub fn withdraw(assets: U256, receiver: Address, owner: Address) -> Bytes {
    IVault::withdrawCall {
        assets,
        receiver,
        owner,
    }
    .abi_encode()
    .into()
}

/// Name of a vault custom error encoded in revert data, if it is one we know.
pub fn decode_vault_error(data: &[u8]) -> Option<String> {
    IVault::InsufficientShares::abi_decode(data, true)
        .ok()
        .map(|_| "InsufficientShares".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex};

    #[test]
    fn test_selectors() {
        assert_eq!(hex::encode(IERC20::balanceOfCall::SELECTOR), "70a08231");
        assert_eq!(hex::encode(IERC20::approveCall::SELECTOR), "095ea7b3");
        assert_eq!(hex::encode(IMockStablecoin::mintCall::SELECTOR), "40c10f19");
        assert_eq!(hex::encode(IVault::depositCall::SELECTOR), "6e553f65");
        assert_eq!(hex::encode(IVault::withdrawCall::SELECTOR), "b460af94");
    }

    #[test]
    fn test_approve_encoding() {
        let spender = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");
        let data = approve(spender, U256::from(100_000_000u64));
        assert_eq!(data.len(), 4 + 32 * 2);
        assert_eq!(&data[..4], &IERC20::approveCall::SELECTOR);
        assert_eq!(&data[16..36], spender.as_slice());
    }

    #[test]
    fn test_decode_vault_error() {
        let data = IVault::InsufficientShares {}.abi_encode();
        assert_eq!(decode_vault_error(&data).as_deref(), Some("InsufficientShares"));
        assert_eq!(decode_vault_error(&[0xde, 0xad, 0xbe, 0xef]), None);
    }
}
