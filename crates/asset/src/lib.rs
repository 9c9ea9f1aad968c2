//! Asset loading/parsers.
//! OBJ mesh loader producing an interleaved position+color vertex buffer.

pub mod mesh;
pub mod obj;
