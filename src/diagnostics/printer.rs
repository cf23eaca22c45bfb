//! Text rendering of analysis results

use std::io::{self, Write};

use super::finding::{ClusterAnalysisResult, Finding};
use super::format::{Color, LogHighlighter, RenderConfig, paint, status_line};
use super::summary::ClusterMetadata;

const INDENT: &str = "  ";

pub struct Printer<W: Write> {
    out: W,
    config: RenderConfig,
    highlighter: LogHighlighter,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, config: RenderConfig) -> Self {
        Self {
            out,
            config,
            highlighter: LogHighlighter::new(config),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// One line per healthy cluster; for an unhealthy one, its findings
    /// depth first, each with its recommendation and logs beneath it
    pub fn process(&mut self, results: &[ClusterAnalysisResult]) -> io::Result<()> {
        for result in results {
            if result.is_healthy() {
                writeln!(
                    self.out,
                    "Cluster {} is {}",
                    result.cluster,
                    paint("healthy", Color::Green, self.config)
                )?;
                continue;
            }

            writeln!(
                self.out,
                "Cluster {} is {}",
                result.cluster,
                paint("unhealthy", Color::Red, self.config)
            )?;
            for finding in &result.findings {
                for (depth, nested) in finding.flatten() {
                    self.print_finding(depth + 1, nested)?;
                }
            }
        }
        self.out.flush()
    }

    fn print_finding(&mut self, depth: usize, finding: &Finding) -> io::Result<()> {
        let indent = INDENT.repeat(depth);
        writeln!(
            self.out,
            "{}{}",
            indent,
            status_line(&finding.status, Some(finding.severity), self.config)
        )?;

        let detail_indent = INDENT.repeat(depth + 1);
        if let Some(recommendation) = &finding.recommendation {
            writeln!(
                self.out,
                "{}{} {}",
                detail_indent,
                paint("Recommendation:", Color::Magenta, self.config),
                recommendation
            )?;
        }

        for log in &finding.logs {
            writeln!(
                self.out,
                "{}{}",
                detail_indent,
                paint(&format!("Logs ({}):", log.source), Color::Magenta, self.config)
            )?;
            for line in &log.lines {
                writeln!(
                    self.out,
                    "{}{}{}",
                    detail_indent,
                    INDENT,
                    self.highlighter.highlight(line)
                )?;
            }
        }
        Ok(())
    }

    pub fn print_summary(&mut self, metadata: &ClusterMetadata) -> io::Result<()> {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        let rows = [
            (
                "EKS-A version",
                metadata.eksa_version.as_deref().unwrap_or("unknown").to_string(),
            ),
            ("Kubernetes version", metadata.kubernetes_version.clone()),
            ("Provider", metadata.provider.clone()),
            (
                "Control plane nodes",
                metadata.control_plane_count.to_string(),
            ),
            ("External etcd", yes_no(metadata.external_etcd).to_string()),
            ("Registry mirror", yes_no(metadata.registry_mirror).to_string()),
            (
                "OS family",
                metadata.os_family.as_deref().unwrap_or("unknown").to_string(),
            ),
        ];

        writeln!(self.out, "Cluster {}", metadata.cluster)?;
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
        for (label, value) in rows {
            writeln!(
                self.out,
                "{}{:<width$} {}",
                INDENT,
                format!("{}:", label),
                paint(&value, Color::Cyan, self.config),
                width = width
            )?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::finding::{Log, ObjectRef, StatusLine};

    fn render(results: &[ClusterAnalysisResult], config: RenderConfig) -> String {
        let mut printer = Printer::new(Vec::new(), config);
        printer.process(results).unwrap();
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn test_healthy_cluster_is_one_line() {
        let out = render(
            &[ClusterAnalysisResult {
                cluster: ObjectRef::new("demo", "eksa-system"),
                findings: Vec::new(),
            }],
            RenderConfig::plain(),
        );
        assert_eq!(out, "Cluster eksa-system/demo is healthy\n");
    }

    #[test]
    fn test_unhealthy_cluster_lists_every_finding() {
        let mut root = Finding::error(StatusLine::object(
            "KubeadmControlPlane",
            "ns",
            "demo",
            "not ready",
        ));
        root.findings.push(
            Finding::error(StatusLine::object("Machine", "ns", "m-1", "not ready"))
                .with_recommendation("check the node")
                .with_log(Log {
                    source: "capt-system/capt-controller-manager".to_string(),
                    lines: vec!["E0101 boom".to_string()],
                }),
        );

        let out = render(
            &[ClusterAnalysisResult {
                cluster: ObjectRef::new("demo", "ns"),
                findings: vec![root],
            }],
            RenderConfig::plain(),
        );

        insta::assert_snapshot!(out, @r"
        Cluster ns/demo is unhealthy
          KubeadmControlPlane ns/demo is not ready
            Machine ns/m-1 is not ready
              Recommendation: check the node
              Logs (capt-system/capt-controller-manager):
                E0101 boom
        ");
    }

    #[test]
    fn test_colored_status_token() {
        let out = render(
            &[ClusterAnalysisResult {
                cluster: ObjectRef::new("demo", "ns"),
                findings: vec![Finding::warning(StatusLine::object(
                    "Workflow", "ns", "wf", "running",
                ))],
            }],
            RenderConfig::colored(),
        );
        assert!(out.contains("Workflow ns/wf is \x1b[33mrunning\x1b[0m"));
        assert!(out.starts_with("Cluster ns/demo is \x1b[31munhealthy\x1b[0m\n"));
    }

    #[test]
    fn test_summary() {
        let mut printer = Printer::new(Vec::new(), RenderConfig::plain());
        printer
            .print_summary(&ClusterMetadata {
                cluster: ObjectRef::new("demo", "default"),
                eksa_version: Some("v0.21.0".to_string()),
                kubernetes_version: "1.31".to_string(),
                provider: "Tinkerbell".to_string(),
                control_plane_count: 3,
                external_etcd: false,
                registry_mirror: true,
                os_family: None,
            })
            .unwrap();
        let out = String::from_utf8(printer.into_inner()).unwrap();

        insta::assert_snapshot!(out, @r"
        Cluster default/demo
          EKS-A version:       v0.21.0
          Kubernetes version:  1.31
          Provider:            Tinkerbell
          Control plane nodes: 3
          External etcd:       no
          Registry mirror:     yes
          OS family:           unknown
        ");
    }
}
