//! Procedural macros for servicenow-mcp
//!
//! This crate provides the `#[incident_tool]` attribute macro for defining
//! ServiceNow MCP tools with minimal boilerplate.

use darling::{FromMeta, ast::NestedMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

/// Arguments for the `#[incident_tool]` attribute
#[derive(Debug, FromMeta)]
struct IncidentToolArgs {
    /// Tool name (e.g., "create_incident")
    name: String,
    /// Tool description for MCP
    description: String,
    /// Operation type: "read" or "write"
    operation: String,
}

/// Attribute macro for ServiceNow MCP tools.
///
/// This macro generates:
/// - `ToolInfo` implementation (name, description, operation_type)
/// - `#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]` on the struct
///
/// # Example
///
/// ```ignore
/// #[incident_tool(
///     name = "add_comment",
///     description = "Add a comment or work note to an incident",
///     operation = "write"
/// )]
/// pub struct AddComment {
///     /// Incident sys_id or number
///     pub incident_id: String,
///     /// Comment text
///     pub comment: String,
///     #[serde(default)]
///     pub is_work_note: bool,
/// }
///
/// #[async_trait]
/// impl ToolExecutor for AddComment {
///     async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn incident_tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.to_compile_error()),
    };

    let args = match IncidentToolArgs::from_list(&attr_args) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.write_errors()),
    };

    let input = parse_macro_input!(item as DeriveInput);
    let expanded = impl_incident_tool(&args, &input);

    TokenStream::from(expanded)
}

fn impl_incident_tool(args: &IncidentToolArgs, input: &DeriveInput) -> TokenStream2 {
    let struct_name = &input.ident;
    let tool_name = &args.name;
    let description = &args.description;

    let operation_variant = match args.operation.as_str() {
        "read" => quote! { crate::access_control::OperationType::Read },
        "write" => quote! { crate::access_control::OperationType::Write },
        other => {
            return syn::Error::new_spanned(
                input,
                format!("Unknown operation: {}. Use: read or write", other),
            )
            .to_compile_error();
        }
    };

    let vis = &input.vis;
    let attrs = &input.attrs;
    let generics = &input.generics;

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    input,
                    "incident_tool only supports structs with named fields",
                )
                .to_compile_error();
            }
        },
        _ => {
            return syn::Error::new_spanned(input, "incident_tool only supports structs")
                .to_compile_error();
        }
    };

    quote! {
        #(#attrs)*
        #[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
        #vis struct #struct_name #generics {
            #fields
        }

        impl crate::tools::ToolInfo for #struct_name {
            fn name() -> &'static str {
                #tool_name
            }

            fn description() -> &'static str {
                #description
            }

            fn operation_type() -> crate::access_control::OperationType {
                #operation_variant
            }
        }
    }
}
