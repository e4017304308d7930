//! Mock Prometheus exporter

use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockExporterServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockExporterServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    pub fn metrics_url(&self) -> String {
        format!("{}/metrics", self.base_url)
    }

    pub async fn mock_metrics(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_failure(&self, status_code: u16) {
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(status_code))
            .mount(&self.server)
            .await;
    }

    /// A host using `ram_used_percent` of its memory and little else
    pub fn body_with_ram_usage(ram_used_percent: u64) -> String {
        format!(
            "process_cpu_seconds_total 10\n\
             go_memstats_alloc_bytes 10\n\
             go_memstats_alloc_bytes_total 100\n\
             process_virtual_memory_bytes 2048\n\
             process_open_fds 10\n\
             process_max_fds 100\n\
             node_cpu_seconds_total{{cpu=\"0\",mode=\"idle\"}} 90\n\
             node_cpu_seconds_total{{cpu=\"0\",mode=\"user\"}} 10\n\
             node_memory_MemTotal_bytes 100\n\
             node_memory_MemAvailable_bytes {}\n\
             node_filesystem_avail_bytes{{mountpoint=\"/\"}} 50\n\
             node_filesystem_size_bytes{{mountpoint=\"/\"}} 100\n",
            100 - ram_used_percent
        )
    }
}
