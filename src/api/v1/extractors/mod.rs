/**
 * Responsibility
 *  - handler が受け取る extractor 型を外部に公開する
 */
mod export_headers;

pub use export_headers::ExportHeaders;
