mod seek_ext;
mod shared_stream;
mod stream;

pub use seek_ext::SeekExt;
pub use shared_stream::SharedStream;
pub use stream::{InputStream, StreamError, StreamResult};

use std::{fmt, io};

pub trait Reader: io::Read + io::Seek + fmt::Debug {}
impl<T: io::Read + io::Seek + fmt::Debug + ?Sized> Reader for T {}
