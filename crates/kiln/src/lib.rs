#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[doc(inline)]
pub use kiln_ast as ast;
#[doc(inline)]
pub use kiln_config as config;
#[doc(inline)]
pub use kiln_data_structures as data_structures;
#[doc(inline)]
pub use kiln_interface as interface;
#[doc(inline)]
pub use kiln_sema as sema;
