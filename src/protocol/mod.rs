pub mod request;
pub mod response;

pub use request::{
    CreatePageParams, GetPageParams, GetSpaceParams, InitializeParams, JsonRpcRequest,
    LimitParams, ResourceReadParams, RpcId, SearchParams, SetupAction, SetupParams,
    ToolCallParams, UpdatePageParams,
};
pub use response::{
    JsonRpcError, JsonRpcResponse, ResourceContents, ResourceReadResult, ToolResult,
    ToolResultContent,
};
