//! MCP tool server exposing the single `find_brick` tool.
//!
//! Protocol handling (handshake, `ping`, `tools/list`, request dispatch and
//! concurrency) is rmcp's [`ServerHandler`]; this module supplies the tool
//! list and the call. Input reaches rmcp through the `transport` gate, which
//! answers undecodable lines itself so the session survives them.
//!
//! | Method                       | Reply                                  |
//! |------------------------------|----------------------------------------|
//! | `initialize`                 | protocol version, capabilities, info   |
//! | `ping`                       | `{}`                                   |
//! | `tools/list`                 | the `find_brick` descriptor            |
//! | `tools/call`                 | `CallToolResult`                       |
//! | any notification             | nothing                                |

pub mod tools;
mod transport;

use crate::config::{OutputFormat, RecognitionConfig};
use crate::error::BrickFinderError;
use crate::pipeline::upload::BrickognizeClient;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

pub const SERVER_NAME: &str = "brick-finder";

const INSTRUCTIONS: &str = "Brick finder: call find_brick with the path of a local JPEG or PNG \
photo of a LEGO part to get ranked identification candidates from Brickognize, \
with BrickLink links and predicted colors.";

/// The tool server. Holds only immutable configuration and a shareable HTTP
/// client, so one instance serves any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct McpServer {
    client: BrickognizeClient,
    output_format: OutputFormat,
}

impl McpServer {
    pub fn new(config: &RecognitionConfig) -> Result<Self, BrickFinderError> {
        Ok(Self {
            client: BrickognizeClient::new(config)?,
            output_format: config.output_format,
        })
    }

    /// Serve one MCP session read from `reader` and written to `writer`.
    ///
    /// Returns once `reader` reaches EOF and every accepted request has been
    /// answered, or as soon as `writer` fails.
    pub async fn run<R, W>(self, reader: R, writer: W) -> Result<(), BrickFinderError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        transport::serve_guarded(reader, writer, move |input, output| async move {
            let running = self
                .serve((input, output))
                .await
                .map_err(|e| BrickFinderError::Session(e.to_string()))?;
            running
                .waiting()
                .await
                .map_err(|e| BrickFinderError::Session(e.to_string()))?;
            debug!("MCP session closed");
            Ok::<(), BrickFinderError>(())
        })
        .await
    }

    /// Serve on the process's stdin/stdout.
    pub async fn serve_stdio(self) -> Result<(), BrickFinderError> {
        info!("{} serving on stdio", SERVER_NAME);
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(vec![tools::find_brick_tool()]))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if request.name != tools::FIND_BRICK {
            return Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ));
        }
        // An absent file_path is reported by the pipeline as MissingArgument.
        let file_path = tools::file_path_argument(request.arguments.as_ref())?;
        Ok(tools::call_find_brick(&self.client, &file_path, self.output_format).await)
    }
}
