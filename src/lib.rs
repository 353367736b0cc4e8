//! Backend de SmartAg.
//!
//! Diagnóstico de enfermedades en hojas de cultivo con un clasificador ONNX y
//! registro de la última lectura del sensor de campo (temperatura, humedad y
//! humedad del suelo). Arquitectura hexagonal: `domain` no depende de nada
//! externo, `application` define puertos y casos de uso, `adapters` implementa
//! HTTP (Axum), ONNX Runtime y sistema de ficheros.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
