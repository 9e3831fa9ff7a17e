//! Modelpin Core Types and Definitions
//!
//! This crate provides the foundational types shared by the directive parser
//! and the output resolver. It includes:
//!
//! - **Graph**: An arena-backed computation graph with forward and reverse
//!   adjacency ([`graph::Graph`])
//! - **Attributes**: Node attribute values and the well-known override keys
//!   ([`attr`] module)
//! - **Op types**: String-interned operator type tags ([`op_type::OpType`])
//! - **Tensor**: Output datatypes and tensor layouts ([`tensor`] module)
//! - **Framework**: Source-framework strategy and its capability set
//!   ([`framework::Framework`])

pub mod attr;
pub mod framework;
pub mod graph;
pub mod op_type;
pub mod tensor;
