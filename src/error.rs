// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Contains all possible errors that may occur during interaction with the
//! graphics API.
//!
//! Compile and link failures are *not* represented here: those are absorbed
//! into the log by [`crate::program`]. The only error the binding layer can
//! return as a value is the driver refusing to allocate an object.

/// Set of possible graphics layer errors.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    /// A driver-side failure with no dedicated variant, carrying the message
    /// as is.
    #[error("Custom error: {0}")]
    Custom(String),
}

impl From<String> for FrameworkError {
    fn from(v: String) -> Self {
        Self::Custom(v)
    }
}

#[cfg(test)]
mod test {
    use super::FrameworkError;

    #[test]
    fn custom_from_string() {
        let error: FrameworkError = "out of memory".to_string().into();
        assert!(matches!(error, FrameworkError::Custom(ref msg) if msg == "out of memory"));
        assert_eq!(error.to_string(), "Custom error: out of memory");
    }
}
