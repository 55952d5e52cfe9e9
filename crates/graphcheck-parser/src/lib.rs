pub mod extract;
pub mod file_collect;
pub mod language;
pub mod module_path;
pub mod parser;

pub use extract::{
    first_error_node, imports_of_statement, literal_kind_of, node_text, ModuleExtractor,
};
pub use file_collect::{collect_python_files, FileCollectionConfig};
pub use language::{is_python_source, python_parser};
pub use module_path::ModulePathResolver;
pub use parser::{DirectoryParse, PythonParser};
