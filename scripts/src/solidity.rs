//! Definitions of Solidity functions called during deployment

use alloy::sol;

sol! {
    /// The initializer of the root contract
    interface IAuditSign {
        function initialize(string memory baseUri, address admin, address signer) external;
    }

    /// The initializer of the mirror contract
    interface IAuditSignMirror {
        function initialize(string memory baseUri, address admin, address signer, address rootContract) external;
    }

    #[sol(rpc)]
    interface IProxyAdmin {
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function upgrade(address proxy, address implementation) external;
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }
}
