//! Allow-list of resource types that expose Azure Monitor metrics.

/// Comma-delimited resource types known to publish metric definitions
const TYPES_ALLOWED: &str = "Microsoft.AnalysisServices/servers,CloudSimple.PrivateCloudIaaS/virtualMachines,\
Microsoft.Web/serverFarms,Microsoft.Web/sites,Microsoft.Web/sites/slots,\
Microsoft.Web/hostingEnvironments/multiRolePools,Microsoft.Web/hostingEnvironments/workerPools,\
test.shoebox/testresources,test.shoebox/testresources2,Microsoft.ServiceBus/namespaces,\
Microsoft.Network/virtualNetworks,Microsoft.Network/publicIPAddresses,Microsoft.Network/networkInterfaces,\
Microsoft.Network/loadBalancers,Microsoft.Network/networkWatchers/connectionMonitors,\
Microsoft.Network/virtualNetworkGateways,Microsoft.Network/connections,Microsoft.Network/applicationGateways,\
Microsoft.Network/dnszones,Microsoft.Network/trafficmanagerprofiles,Microsoft.Network/expressRouteCircuits,\
Microsoft.Network/expressRoutePorts,Microsoft.Network/azureFirewalls,Microsoft.Network/frontdoors,\
Microsoft.DBforMySQL/servers,Microsoft.Sql/servers,Microsoft.Sql/servers/databases,\
Microsoft.Sql/servers/elasticpools,Microsoft.Sql/managedInstances,microsoft.insights/components,\
microsoft.insights/autoscalesettings,Microsoft.KeyVault/vaults,Microsoft.Cache/Redis,\
Microsoft.ContainerRegistry/registries,Microsoft.LocationBasedServices/accounts,\
Microsoft.DocumentDB/databaseAccounts,Microsoft.ContainerInstance/containerGroups,Microsoft.Devices/IotHubs,\
Microsoft.Devices/ElasticPools,Microsoft.Devices/ElasticPools/IotHubTenants,Microsoft.Devices/ProvisioningServices,\
Microsoft.Compute/virtualMachines,Microsoft.Compute/virtualMachineScaleSets,\
Microsoft.Compute/virtualMachineScaleSets/virtualMachines,Microsoft.ClassicCompute/domainNames/slots/roles,\
Microsoft.ClassicCompute/virtualMachines,Microsoft.SignalRService/SignalR,Microsoft.DataBoxEdge/DataBoxEdgeDevices,\
Microsoft.Search/searchServices,Microsoft.Logic/workflows,Microsoft.Logic/integrationServiceEnvironments,\
Microsoft.HDInsight/clusters,Microsoft.Relay/namespaces,Microsoft.EventHub/namespaces,Microsoft.EventHub/clusters,\
Microsoft.Kusto/clusters,Microsoft.OperationalInsights/workspaces,Microsoft.Maps/accounts,\
Microsoft.DBforMariaDB/servers,Microsoft.TimeSeriesInsights/environments,\
Microsoft.TimeSeriesInsights/environments/eventsources,Microsoft.DBforPostgreSQL/servers,\
Microsoft.StreamAnalytics/streamingjobs,Microsoft.NotificationHubs/namespaces/notificationHubs,\
Microsoft.ApiManagement/service,Microsoft.Storage/storageAccounts,Microsoft.Storage/storageAccounts/blobServices,\
Microsoft.Storage/storageAccounts/tableServices,Microsoft.Storage/storageAccounts/queueServices,\
Microsoft.Storage/storageAccounts/fileServices,Microsoft.DataLakeAnalytics/accounts,\
Microsoft.PowerBIDedicated/capacities,Microsoft.IoTSpaces/Graph,Microsoft.Automation/automationAccounts,\
Microsoft.DataLakeStore/accounts,Microsoft.DataFactory/dataFactories,Microsoft.DataFactory/factories,\
Microsoft.NetApp/netAppAccounts/capacityPools,Microsoft.NetApp/netAppAccounts/capacityPools/volumes,\
Microsoft.StorageSync/storageSyncServices,Microsoft.StorageSync/storageSyncServices/syncGroups,\
Microsoft.StorageSync/storageSyncServices/syncGroups/serverEndpoints,\
Microsoft.StorageSync/storageSyncServices/registeredServers,Microsoft.ContainerService/managedClusters,\
Microsoft.CustomerInsights/hubs,Microsoft.Batch/batchAccounts,Microsoft.EventGrid/eventSubscriptions,\
Microsoft.EventGrid/topics,Microsoft.EventGrid/domains,Microsoft.EventGrid/extensionTopics,\
Microsoft.CognitiveServices/accounts";

/// Iterate the allow-list entries
pub fn allowed_types() -> impl Iterator<Item = &'static str> {
    TYPES_ALLOWED.split(',')
}

/// Whether `resource_type` is a whole entry of the allow-list.
///
/// Matching is exact per entry: a prefix of a longer entry, or text spanning
/// the delimiter between two entries, does not match.
pub fn is_supported(resource_type: &str) -> bool {
    if resource_type.trim().is_empty() {
        return false;
    }

    allowed_types().any(|entry| entry == resource_type)
}
