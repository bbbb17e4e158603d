/// Workflow identifier as it appears in the source export.
/// Example: `Licenciamento Ambiental`
pub type FlowId = String;
/// Service identifier within a flow.
/// Example: `Emissão de Alvará`
pub type ServiceId = String;
/// Form identifier associated with a service.
/// Example: `FRM_CADASTRO_REQUERENTE`
pub type FormId = String;
/// Process step identifier within a flow.
/// Example: `Análise Técnica`
pub type StepId = String;
/// Raw field identifier whose naming prefix drives enrichment.
/// Examples: `TXT_NOME`, `CPF_REQUERENTE`, `ZZZ_CUSTOM`
pub type FieldName = String;
/// Free-text caption attached to a sub-field.
/// Example: `Número do documento`
pub type Caption = String;
/// Record author name.
/// Example: `maria.souza`
pub type Author = String;
/// Component-type label inferred from a field-name prefix.
/// Examples: `TextBox`, `Telefone`, `Outros/Sem Padrão`
pub type ComponentLabel = String;
/// Calendar year extracted from `created_at`.
/// Example: `2024`
pub type Year = i32;
