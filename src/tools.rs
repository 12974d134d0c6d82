//! Gateway tools
//!
//! The `get-customer-details` tool, backed by the customer details bridge.

use {
    crate::bridge::CustomerDetailsClient,
    crate::error::{McpError, McpResult},
    crate::handler::{McpContext, McpHandler, ToolDefinition},
    crate::logging,
    async_trait::async_trait,
    schemars::JsonSchema,
    serde::Deserialize,
    serde_json::{json, Value},
    tracing::{error, info},
};

pub const GET_CUSTOMER_DETAILS: &str = "get-customer-details";

/// Arguments of `get-customer-details`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCustomerDetailsArgs {
    /// Customer ID
    #[serde(rename = "customerNo")]
    pub customer_no: String,
}

pub struct CustomerTools {
    client: CustomerDetailsClient,
}

impl CustomerTools {
    pub fn new(client: CustomerDetailsClient) -> Self {
        Self { client }
    }

    pub fn definitions() -> McpResult<Vec<ToolDefinition>> {
        let schema = schemars::schema_for!(GetCustomerDetailsArgs);
        Ok(vec![ToolDefinition {
            name: GET_CUSTOMER_DETAILS.to_string(),
            description: "Get customer details".to_string(),
            input_schema: serde_json::to_value(&schema)?,
        }])
    }

    async fn get_customer_details(&self, arguments: Value) -> McpResult<Value> {
        let args: GetCustomerDetailsArgs = serde_json::from_value(arguments)
            .map_err(|e| McpError::InvalidParams(format!("{GET_CUSTOMER_DETAILS}: {e}")))?;

        match self.client.fetch(&args.customer_no).await {
            Ok(details) => {
                info!(customer_no = %args.customer_no, "Customer details fetched");
                Ok(text_result(serde_json::to_string_pretty(&details)?))
            }
            Err(e) => {
                error!(customer_no = %args.customer_no, error = %e, "Customer lookup failed");
                Ok(error_result(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl McpHandler for CustomerTools {
    async fn list_tools(&self, _context: &McpContext) -> McpResult<Vec<ToolDefinition>> {
        Self::definitions()
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        _context: &McpContext,
    ) -> McpResult<Value> {
        logging::log_tool_call(name, &arguments);
        match name {
            GET_CUSTOMER_DETAILS => self.get_customer_details(arguments).await,
            _ => Err(McpError::UnknownTool(name.to_string())),
        }
    }
}

/// Tool result carrying a single text block
pub fn text_result(text: String) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ]
    })
}

/// Failed tool result; only the error message is returned
pub fn error_result(message: String) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": message
            }
        ],
        "isError": true
    })
}
