use std::fmt::Display;
use std::future::Future;

use crate::device::{ProgramHandle, ShaderCompiler};
use crate::error::{Error, Result};

/// Vertex + fragment source pair and, once compiled, its program handle.
#[derive(Debug, Clone)]
pub struct Shader {
    vertex_source: String,
    fragment_source: String,
    program: Option<ProgramHandle>,
}

impl Shader {
    pub fn new(vertex_source: impl Into<String>, fragment_source: impl Into<String>) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            program: None,
        }
    }

    /// Retrieves both sources through `fetch`, concurrently.
    ///
    /// `fetch` maps a location (path, URL, asset key) to its text. The first
    /// failure is reported as [`Error::ShaderSource`].
    pub async fn load_from<F, Fut, E>(
        fetch: F,
        vertex_location: &str,
        fragment_location: &str,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Fut,
        Fut: Future<Output = std::result::Result<String, E>>,
        E: Display,
    {
        let load = |location: &str| {
            let pending = fetch(location);
            let path = location.to_owned();
            async move {
                pending.await.map_err(|e| Error::ShaderSource {
                    path,
                    message: e.to_string(),
                })
            }
        };

        let (vertex_source, fragment_source) =
            futures::future::try_join(load(vertex_location), load(fragment_location)).await?;

        log::debug!("loaded shader sources `{vertex_location}` + `{fragment_location}`");
        Ok(Self::new(vertex_source, fragment_source))
    }

    #[inline]
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    #[inline]
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    #[inline]
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.program.is_some()
    }

    /// Compiles and links both stages. No-op when already compiled.
    pub fn compile<C>(&mut self, compiler: &mut C) -> Result<ProgramHandle>
    where
        C: ShaderCompiler + ?Sized,
    {
        if let Some(program) = self.program {
            return Ok(program);
        }

        let program = compiler.compile(&self.vertex_source, &self.fragment_source)?;
        self.program = Some(program);
        Ok(program)
    }
}
