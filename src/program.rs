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

//! GPU program wrapper. Compiles a vertex/fragment GLSL source pair into a
//! program object and uploads uniform values into it by name.
//!
//! Compile and link failures are written to the log and do not fail
//! construction; the program object is kept in whatever state the driver left
//! it in. Uniform names are resolved against the driver on every call, there
//! is no location cache.
//!
//! The setters fall into two groups with different behavior for a name that
//! does not resolve:
//!
//! - instance setters ([`ShaderProgram::set_matrix4`],
//!   [`ShaderProgram::set_vector4`]) log a warning and still attempt the
//!   write, which has no effect for an unresolved location;
//! - free-function setters ([`set_uniform_vector4`] logs a warning, the rest
//!   stay silent) skip the write entirely.
//!
//! The split is long-standing behavior that callers rely on for log noise
//! levels, so it is kept as is.

use crate::{err, error::FrameworkError, warn};
use glow::HasContext;
use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use std::{fs, marker::PhantomData, path::Path, rc::Rc};

/// Driver diagnostic text is clamped to this many bytes before logging.
const MAX_INFO_LOG_LEN: usize = 1024;

/// Target of a post-compile or post-link status query.
enum StatusCheck {
    Stage(glow::Shader),
    Program(glow::Program),
}

fn read_source(path: &Path) -> String {
    // A missing or unreadable file becomes an empty source; the compiler
    // diagnostics for it end up in the log like any other bad source.
    fs::read_to_string(path).unwrap_or_default()
}

fn clamp_info_log(mut log: String) -> String {
    if log.len() > MAX_INFO_LOG_LEN {
        let mut cut = MAX_INFO_LOG_LEN;
        while !log.is_char_boundary(cut) {
            cut -= 1;
        }
        log.truncate(cut);
    }
    log
}

fn check_status(gl: &glow::Context, check: StatusCheck) {
    unsafe {
        match check {
            StatusCheck::Stage(shader) => {
                if !gl.get_shader_compile_status(shader) {
                    let info_log = clamp_info_log(gl.get_shader_info_log(shader));
                    err!("Shader Compilation Failed\n{}", info_log);
                }
            }
            StatusCheck::Program(program) => {
                if !gl.get_program_link_status(program) {
                    let info_log = clamp_info_log(gl.get_program_info_log(program));
                    err!("Program Linking Failed\n{}", info_log);
                }
            }
        }
    }
}

fn compile_stage(
    gl: &glow::Context,
    stage: u32,
    source: &str,
) -> Result<glow::Shader, FrameworkError> {
    unsafe {
        let shader = gl.create_shader(stage)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        check_status(gl, StatusCheck::Stage(shader));
        Ok(shader)
    }
}

/// A linked GPU program. Holds the driver-side program object for its entire
/// lifetime and deletes it on drop.
pub struct ShaderProgram {
    gl: Rc<glow::Context>,
    /// Driver-assigned program handle.
    pub id: glow::Program,
    // Force compiler to not implement Send and Sync, because OpenGL is not thread-safe.
    thread_mark: PhantomData<*const u8>,
}

impl ShaderProgram {
    /// Reads both shader stages from disk and builds a program from them.
    ///
    /// A missing or unreadable file is treated as empty source text, which
    /// then fails to compile and is reported through the log like any other
    /// compile error. The returned error covers driver object allocation
    /// only; compile and link failures are logged and leave the program in a
    /// driver-defined state instead of failing construction.
    pub fn from_files<P: AsRef<Path>>(
        gl: Rc<glow::Context>,
        vertex_path: P,
        fragment_path: P,
    ) -> Result<Self, FrameworkError> {
        let vertex_source = read_source(vertex_path.as_ref());
        let fragment_source = read_source(fragment_path.as_ref());
        Self::from_source(gl, &vertex_source, &fragment_source)
    }

    /// Builds a program from in-memory stage sources. Same error contract as
    /// [`Self::from_files`].
    pub fn from_source(
        gl: Rc<glow::Context>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, FrameworkError> {
        unsafe {
            let vertex_shader = compile_stage(&gl, glow::VERTEX_SHADER, vertex_source)?;
            let fragment_shader = compile_stage(&gl, glow::FRAGMENT_SHADER, fragment_source)?;
            let program = gl.create_program()?;
            gl.attach_shader(program, vertex_shader);
            gl.attach_shader(program, fragment_shader);
            gl.link_program(program);
            check_status(&gl, StatusCheck::Program(program));
            // Stage objects are not needed once linked, successfully or not.
            gl.delete_shader(vertex_shader);
            gl.delete_shader(fragment_shader);
            Ok(Self {
                gl,
                id: program,
                thread_mark: PhantomData,
            })
        }
    }

    /// Makes this program the active one for subsequent draw calls.
    pub fn bind(&self) {
        unsafe {
            self.gl.use_program(Some(self.id));
        }
    }

    fn uniform_location(&self, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(self.id, name) }
    }

    /// Uploads a 4x4 float matrix into the uniform `name`.
    ///
    /// Does not rebind the program; the caller must have called
    /// [`Self::bind`]. An unresolved name is logged as a warning and the
    /// write is still attempted, which has no effect.
    pub fn set_matrix4(&self, name: &str, value: &Matrix4<f32>) {
        let location = self.uniform_location(name);
        if location.is_none() {
            warn!("Uniform '{}' not found!", name);
        }
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(location.as_ref(), false, value.as_slice());
        }
    }

    /// Uploads a 4-component float vector into the uniform `name`.
    ///
    /// Does not rebind the program; the caller must have called
    /// [`Self::bind`]. An unresolved name is logged as a warning and the
    /// write is still attempted, which has no effect.
    pub fn set_vector4(&self, name: &str, value: &Vector4<f32>) {
        let location = self.uniform_location(name);
        if location.is_none() {
            warn!("Uniform '{}' not found!", name);
        }
        unsafe {
            self.gl
                .uniform_4_f32(location.as_ref(), value.x, value.y, value.z, value.w);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}

/// Binds `program` and uploads a float into the uniform `name`. Skips the
/// write silently when the name does not resolve.
pub fn set_uniform_f32(gl: &glow::Context, program: glow::Program, name: &str, value: f32) {
    unsafe {
        gl.use_program(Some(program));
        if let Some(location) = gl.get_uniform_location(program, name) {
            gl.uniform_1_f32(Some(&location), value);
        }
    }
}

/// Binds `program` and uploads a 2-component float vector into the uniform
/// `name`. Skips the write silently when the name does not resolve.
pub fn set_uniform_vector2(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
    value: &Vector2<f32>,
) {
    unsafe {
        gl.use_program(Some(program));
        if let Some(location) = gl.get_uniform_location(program, name) {
            gl.uniform_2_f32(Some(&location), value.x, value.y);
        }
    }
}

/// Binds `program` and uploads a 3-component float vector into the uniform
/// `name`. Skips the write silently when the name does not resolve.
pub fn set_uniform_vector3(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
    value: &Vector3<f32>,
) {
    unsafe {
        gl.use_program(Some(program));
        if let Some(location) = gl.get_uniform_location(program, name) {
            gl.uniform_3_f32(Some(&location), value.x, value.y, value.z);
        }
    }
}

/// Binds `program` and uploads a 4-component float vector into the uniform
/// `name`. Unlike the other free-function setters this one logs a warning for
/// a name that does not resolve, then skips the write.
pub fn set_uniform_vector4(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
    value: &Vector4<f32>,
) {
    unsafe {
        gl.use_program(Some(program));
        match gl.get_uniform_location(program, name) {
            Some(location) => {
                gl.uniform_4_f32(Some(&location), value.x, value.y, value.z, value.w)
            }
            None => warn!("Uniform '{}' not found!", name),
        }
    }
}

/// Binds `program` and uploads an integer into the uniform `name`. Skips the
/// write silently when the name does not resolve.
pub fn set_uniform_i32(gl: &glow::Context, program: glow::Program, name: &str, value: i32) {
    unsafe {
        gl.use_program(Some(program));
        if let Some(location) = gl.get_uniform_location(program, name) {
            gl.uniform_1_i32(Some(&location), value);
        }
    }
}

/// Binds `program` and uploads a 2-component integer vector into the uniform
/// `name`. Skips the write silently when the name does not resolve.
pub fn set_uniform_int_vector2(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
    value: &Vector2<i32>,
) {
    unsafe {
        gl.use_program(Some(program));
        if let Some(location) = gl.get_uniform_location(program, name) {
            gl.uniform_2_i32(Some(&location), value.x, value.y);
        }
    }
}

/// Binds `program` and uploads a 3-component integer vector into the uniform
/// `name`. Skips the write silently when the name does not resolve.
pub fn set_uniform_int_vector3(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
    value: &Vector3<i32>,
) {
    unsafe {
        gl.use_program(Some(program));
        if let Some(location) = gl.get_uniform_location(program, name) {
            gl.uniform_3_i32(Some(&location), value.x, value.y, value.z);
        }
    }
}

/// Binds `program` and uploads a 4x4 float matrix into the uniform `name`.
/// Skips the write silently when the name does not resolve.
pub fn set_uniform_matrix4(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
    value: &Matrix4<f32>,
) {
    unsafe {
        gl.use_program(Some(program));
        if let Some(location) = gl.get_uniform_location(program, name) {
            gl.uniform_matrix_4_f32_slice(Some(&location), false, value.as_slice());
        }
    }
}

#[cfg(test)]
mod test {
    use super::{clamp_info_log, read_source, MAX_INFO_LOG_LEN};
    use std::{fs, path::PathBuf};

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("veronika_graphics_{}_{}", std::process::id(), name))
    }

    #[test]
    fn missing_source_file_reads_as_empty() {
        let path = temp_file("does_not_exist.vert");
        assert_eq!(read_source(&path), "");
    }

    #[test]
    fn source_file_round_trips() {
        let path = temp_file("pass_through.frag");
        let source = "#version 330 core\nvoid main() { }\n";
        fs::write(&path, source).unwrap();
        assert_eq!(read_source(&path), source);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn short_info_log_passes_through() {
        let log = "0:12(1): error: syntax error".to_string();
        assert_eq!(clamp_info_log(log.clone()), log);

        let exact = "a".repeat(MAX_INFO_LOG_LEN);
        assert_eq!(clamp_info_log(exact.clone()), exact);
    }

    #[test]
    fn long_info_log_is_clamped() {
        let log = "a".repeat(MAX_INFO_LOG_LEN * 2);
        assert_eq!(clamp_info_log(log).len(), MAX_INFO_LOG_LEN);
    }

    #[test]
    fn clamp_does_not_split_characters() {
        // "ab" followed by 3-byte characters puts no character boundary at
        // the clamp offset, so the cut has to back off.
        let log = format!("ab{}", "\u{20ac}".repeat(400));
        let clamped = clamp_info_log(log);
        assert_eq!(clamped.len(), 1022);
        assert!(clamped.ends_with('\u{20ac}'));
    }
}
